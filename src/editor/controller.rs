use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    models::{
        draft::{Draft, DraftUpdate},
        status::DraftState,
        template::{Template, TemplateVersion, TemplateVersionCreate},
    },
    renderer::Variables,
};

/// Working-copy state for one editing session.
///
/// Holds the last persisted version as an immutable baseline and a mutable
/// draft. Dirtiness is tracked by state, not by comparing values: any field
/// write marks the draft dirty, even if it writes the value already there.
/// None of the operations can fail.
#[derive(Debug, Clone)]
pub struct DraftController {
    template: Option<Template>,
    persisted: Option<TemplateVersion>,
    draft: Draft,
    state: DraftState,
    language: String,
    default_language: String,
    test_variables: HashMap<String, String>,
}

impl Default for DraftController {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl DraftController {
    pub fn new(default_language: &str) -> Self {
        Self {
            template: None,
            persisted: None,
            draft: Draft::default(),
            state: DraftState::Uninitialized,
            language: default_language.to_string(),
            default_language: default_language.to_string(),
            test_variables: HashMap::new(),
        }
    }

    /// Loads a template and its latest version, replacing all session state.
    pub fn initialize(&mut self, template: Template, version: Option<TemplateVersion>) {
        info!(
            template_id = %template.id,
            version = ?version.as_ref().map(|v| v.version_number),
            "Initializing editor session"
        );

        self.draft = version.as_ref().map(Draft::from).unwrap_or_default();
        self.language = self.language_of(version.as_ref());
        self.persisted = version;
        self.template = Some(template);
        self.test_variables.clear();
        self.state = DraftState::Loaded;
    }

    pub fn update_draft_field(&mut self, update: DraftUpdate) {
        debug!(field = %update.field(), previous_state = %self.state, "Draft field updated");

        self.draft.apply(update);
        self.state = DraftState::Editing;
    }

    /// Adopts a version the template service has acknowledged as the new baseline.
    ///
    /// Only call after the save has succeeded.
    pub fn commit_save(&mut self, version: TemplateVersion) {
        info!(
            version_id = %version.id,
            version = version.version_number,
            "Committing saved version as baseline"
        );

        self.draft = Draft::from(&version);
        self.language = self.language_of(Some(&version));
        self.persisted = Some(version);
        self.state = DraftState::Loaded;
    }

    /// Discards all draft edits. Without a persisted version the draft empties.
    pub fn reset_to_baseline(&mut self) {
        debug!(previous_state = %self.state, "Resetting draft to baseline");

        self.draft = self.persisted.as_ref().map(Draft::from).unwrap_or_default();
        self.language = self.language_of(self.persisted.as_ref());
        self.state = if self.template.is_some() {
            DraftState::Loaded
        } else {
            DraftState::Uninitialized
        };
    }

    pub fn set_test_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.test_variables.insert(key.into(), value.into());
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.template.is_some()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn persisted_version(&self) -> Option<&TemplateVersion> {
        self.persisted.as_ref()
    }

    pub fn test_variables(&self) -> &HashMap<String, String> {
        &self.test_variables
    }

    pub fn test_variable(&self, key: &str) -> Option<&str> {
        self.test_variables.get(key).map(String::as_str)
    }

    /// The test bag as renderer input, each value coerced by its declared type.
    pub fn preview_variables(&self) -> Variables {
        let schema = &self.draft.variables_schema;

        self.test_variables
            .iter()
            .map(|(name, raw)| {
                let value = match schema.declared_type(name) {
                    Some(kind) => kind.coerce(raw),
                    None => serde_json::Value::String(raw.clone()),
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Payload for persisting the current draft as a new version.
    pub fn save_payload(&self) -> TemplateVersionCreate {
        TemplateVersionCreate {
            subject: self.draft.subject.clone(),
            body_html: self.draft.body_html.clone(),
            body_text: self.draft.body_text.clone(),
            variables_schema: self.draft.variables_schema.clone(),
            language: self.language.clone(),
        }
    }

    fn language_of(&self, version: Option<&TemplateVersion>) -> String {
        version
            .map(|v| v.language.as_str())
            .filter(|language| !language.is_empty())
            .unwrap_or(self.default_language.as_str())
            .to_string()
    }
}
