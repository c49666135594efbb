use anyhow::{Error, Result, anyhow};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    config::Config,
    models::{preview::PreviewRequest, template::RenderedContent},
    renderer::{render, render_strict, validate_syntax},
};

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level. Output goes to stderr.
pub fn init_tracing(config: &Config) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.log_level, e))?;

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Renders a JSON-encoded [`PreviewRequest`] and returns the JSON-encoded result.
pub fn process_preview_request(payload: &str, config: &Config) -> Result<String, Error> {
    let request = serde_json::from_str::<PreviewRequest>(payload)
        .map_err(|e| anyhow!("Invalid preview request: {}", e))?;

    debug!(
        variable_count = request.variables.len(),
        strict = config.strict_rendering,
        "Processing preview request"
    );

    let fields = [
        ("subject", &request.subject),
        ("body_html", &request.body_html),
        ("body_text", &request.body_text),
    ];

    for (field, template) in fields {
        if let Err(e) = validate_syntax(template) {
            warn!(field, error = %e, "Template uses unsupported syntax");
        }
    }

    let rendered = if config.strict_rendering {
        let [subject, html, text] = fields.map(|(field, template)| {
            render_strict(template, &request.variables)
                .map_err(|e| anyhow!("Failed to render {}: {}", field, e))
        });

        RenderedContent {
            subject: subject?,
            html: html?,
            text: text?,
        }
    } else {
        RenderedContent {
            subject: render(&request.subject, &request.variables),
            html: render(&request.body_html, &request.variables),
            text: render(&request.body_text, &request.variables),
        }
    };

    info!(
        html_len = rendered.html.len(),
        text_len = rendered.text.len(),
        "Preview rendered"
    );

    Ok(serde_json::to_string(&rendered)?)
}
