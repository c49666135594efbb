use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::preview::PreviewConfig;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_preview_debounce_ms")]
    pub preview_debounce_ms: u64,

    #[serde(default)]
    pub strict_rendering: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_preview_debounce_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            preview_debounce_ms: default_preview_debounce_ms(),
            strict_rendering: false,
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid environmental variable: {}", e))?;
        Ok(config)
    }

    /// Loads from explicit `KEY=value` pairs instead of the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Self>(vars)
            .map_err(|e| anyhow!("Invalid configuration variable: {}", e))
    }

    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            debounce_ms: self.preview_debounce_ms,
        }
    }
}
