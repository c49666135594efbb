use std::io::{Read, Write};

use anyhow::{Error, Result};
use template_editor::{
    config::Config,
    utils::{init_tracing, process_preview_request},
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let mut payload = String::new();
    std::io::stdin().read_to_string(&mut payload)?;

    let rendered = process_preview_request(&payload, &config)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;

    Ok(())
}
