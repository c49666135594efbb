use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use template_editor::models::{
    draft::{VariableType, VariablesSchema},
    template::{Channel, Template, TemplateVersion},
};
use uuid::Uuid;

pub fn template() -> Template {
    Template {
        id: Uuid::new_v4(),
        name: "Welcome email".to_string(),
        slug: "welcome-email".to_string(),
        category: "onboarding".to_string(),
        channel: Channel::Email,
        description: None,
        current_version_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        created_by: None,
        updated_by: None,
    }
}

pub fn version(template_id: Uuid, version_number: u32, body_html: &str) -> TemplateVersion {
    let mut schema = VariablesSchema::new();
    schema
        .declare("name", VariableType::String)
        .expect("valid variable name");

    TemplateVersion {
        id: Uuid::new_v4(),
        template_id,
        version_number,
        subject: "Hello {{ name }}".to_string(),
        body_html: body_html.to_string(),
        body_text: "Hi {{ name }}".to_string(),
        variables_schema: schema,
        language: "en-GB".to_string(),
        is_published: false,
        created_at: Utc::now(),
        created_by: Some("editor@example.com".to_string()),
        published_at: None,
        published_by: None,
    }
}

pub fn vars(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}
