use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::draft::VariablesSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Sms,
    Push,
}

/// Template descriptor as returned by the template service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: String,

    #[serde(default)]
    pub channel: Channel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// A server-acknowledged snapshot of a template's content.
///
/// Never mutated after capture; a later save replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: Uuid,
    pub template_id: Uuid,

    /// Starts at 1 and increases per language.
    #[serde(rename = "version")]
    pub version_number: u32,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub body_html: String,

    #[serde(default)]
    pub body_text: String,

    #[serde(default)]
    pub variables_schema: VariablesSchema,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub is_published: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
}

/// Payload sent to the template service to persist a new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersionCreate {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub variables_schema: VariablesSchema,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}
