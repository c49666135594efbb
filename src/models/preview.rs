use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::template::RenderedContent;

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub debounce_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// Ad-hoc render input accepted by the preview binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub body_html: String,

    #[serde(default)]
    pub body_text: String,

    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub generation: u64,
    pub content: RenderedContent,
}
