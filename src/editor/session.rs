use anyhow::Result as AnyResult;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    editor::{controller::DraftController, preview::PreviewScheduler, store::TemplateStore},
    error::{SchemaError, SessionError},
    models::{
        draft::{Draft, DraftField, DraftUpdate, VariableType, VariablesSchema},
        status::EditorView,
        template::{RenderedContent, Template, TemplateVersion, TemplateVersionCreate},
    },
    renderer::{referenced_variables, validate_syntax},
};

/// Editor state surrounding a [`DraftController`]: in-flight save and
/// publish flags, the active view and the debounced preview.
pub struct EditorSession {
    controller: DraftController,
    preview: PreviewScheduler,
    is_saving: bool,
    is_publishing: bool,
    view: EditorView,
}

impl EditorSession {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            DraftController::new(&config.default_language),
            PreviewScheduler::new(config.preview_config()),
        )
    }

    pub fn from_parts(controller: DraftController, preview: PreviewScheduler) -> Self {
        Self {
            controller,
            preview,
            is_saving: false,
            is_publishing: false,
            view: EditorView::default(),
        }
    }

    pub fn load(&mut self, template: Template, version: Option<TemplateVersion>) {
        self.controller.initialize(template, version);
        self.is_saving = false;
        self.is_publishing = false;
        self.refresh_preview();
    }

    pub fn update_draft_field(&mut self, update: DraftUpdate) {
        self.controller.update_draft_field(update);
        self.refresh_preview();
    }

    pub fn set_test_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.controller.set_test_variable(key, value);
        self.refresh_preview();
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.controller.set_language(language);
    }

    pub fn set_view(&mut self, view: EditorView) {
        self.view = view;
    }

    pub fn reset(&mut self) {
        self.controller.reset_to_baseline();
        self.refresh_preview();
    }

    pub fn add_variable(&mut self) -> String {
        let mut schema = self.schema();
        let name = schema.add_variable();
        self.update_draft_field(DraftUpdate::VariablesSchema(schema));
        name
    }

    /// Renames a declared variable, carrying its test value over to the new name.
    pub fn rename_variable(&mut self, old: &str, new: &str) -> Result<(), SessionError> {
        let mut schema = self.schema();
        schema.rename(old, new)?;

        let new = new.trim();
        if old != new {
            if let Some(value) = self.controller.test_variable(old).map(str::to_string) {
                self.controller.set_test_variable(new, value);
            }
        }

        self.update_draft_field(DraftUpdate::VariablesSchema(schema));
        Ok(())
    }

    pub fn retype_variable(&mut self, name: &str, kind: VariableType) -> Result<(), SessionError> {
        self.edit_schema(|schema| schema.set_type(name, kind))
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<(), SessionError> {
        self.edit_schema(|schema| schema.remove(name))
    }

    pub fn can_save(&self) -> bool {
        self.controller.is_initialized() && self.controller.is_dirty() && !self.is_saving
    }

    pub fn can_publish(&self) -> bool {
        self.controller.is_initialized()
            && self.controller.persisted_version().is_some()
            && !self.controller.is_dirty()
            && !self.is_publishing
    }

    /// Starts a save, returning the template id and the payload to persist.
    pub fn begin_save(&mut self) -> Result<(Uuid, TemplateVersionCreate), SessionError> {
        let template_id = self
            .controller
            .template()
            .map(|template| template.id)
            .ok_or(SessionError::NotInitialized)?;

        if self.is_saving {
            return Err(SessionError::SaveInProgress);
        }
        if !self.controller.is_dirty() {
            return Err(SessionError::NothingToSave);
        }

        self.is_saving = true;
        Ok((template_id, self.controller.save_payload()))
    }

    /// Completes a save started with [`begin_save`](Self::begin_save).
    ///
    /// The draft is only marked clean when `result` is a success.
    pub fn finish_save(
        &mut self,
        result: AnyResult<TemplateVersion>,
    ) -> Result<&TemplateVersion, SessionError> {
        if !self.is_saving {
            return Err(SessionError::NoSaveInProgress);
        }
        self.is_saving = false;

        match result {
            Ok(version) => {
                info!(
                    version_id = %version.id,
                    version = version.version_number,
                    "Template version saved"
                );
                self.controller.commit_save(version);
                self.refresh_preview();
                self.controller
                    .persisted_version()
                    .ok_or(SessionError::NoPersistedVersion)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save template version");
                Err(SessionError::SaveFailed(e))
            }
        }
    }

    pub async fn save<S: TemplateStore>(
        &mut self,
        store: &S,
    ) -> Result<&TemplateVersion, SessionError> {
        let (template_id, payload) = self.begin_save()?;
        let result = store.create_version(template_id, &payload).await;
        self.finish_save(result)
    }

    /// Starts publishing the persisted version, returning template and version ids.
    ///
    /// Refuses while the draft is dirty or when any template field fails
    /// syntax validation.
    pub fn begin_publish(&mut self) -> Result<(Uuid, Uuid), SessionError> {
        let template_id = self
            .controller
            .template()
            .map(|template| template.id)
            .ok_or(SessionError::NotInitialized)?;

        if self.is_publishing {
            return Err(SessionError::PublishInProgress);
        }
        if self.controller.is_dirty() {
            return Err(SessionError::UnsavedChanges);
        }

        let version = self
            .controller
            .persisted_version()
            .ok_or(SessionError::NoPersistedVersion)?;
        let version_id = version.id;

        let draft = Draft::from(version);
        for field in DraftField::TEMPLATES {
            if let Some(text) = draft.text(field) {
                validate_syntax(text)
                    .map_err(|source| SessionError::InvalidTemplate { field, source })?;
            }
        }

        self.is_publishing = true;
        Ok((template_id, version_id))
    }

    pub fn finish_publish(
        &mut self,
        result: AnyResult<TemplateVersion>,
    ) -> Result<&TemplateVersion, SessionError> {
        if !self.is_publishing {
            return Err(SessionError::NoPublishInProgress);
        }
        self.is_publishing = false;

        match result {
            Ok(version) => {
                info!(
                    version_id = %version.id,
                    version = version.version_number,
                    "Template version published"
                );
                self.controller.commit_save(version);
                self.refresh_preview();
                self.controller
                    .persisted_version()
                    .ok_or(SessionError::NoPersistedVersion)
            }
            Err(e) => {
                warn!(error = %e, "Failed to publish template version");
                Err(SessionError::PublishFailed(e))
            }
        }
    }

    pub async fn publish<S: TemplateStore>(
        &mut self,
        store: &S,
    ) -> Result<&TemplateVersion, SessionError> {
        let (template_id, version_id) = self.begin_publish()?;
        let result = store.publish_version(template_id, version_id).await;
        self.finish_publish(result)
    }

    /// Variables the draft references but does not declare, in order of appearance.
    pub fn undeclared_variables(&self) -> Vec<String> {
        let draft = self.controller.draft();
        let mut names: Vec<String> = Vec::new();

        for field in DraftField::TEMPLATES {
            for name in referenced_variables(draft.text(field).unwrap_or_default()) {
                if !draft.variables_schema.contains(&name) && !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        names
    }

    pub fn render_preview(&self) -> RenderedContent {
        self.preview
            .render_now(self.controller.draft(), &self.controller.preview_variables())
    }

    pub fn controller(&self) -> &DraftController {
        &self.controller
    }

    pub fn draft(&self) -> &Draft {
        self.controller.draft()
    }

    pub fn is_dirty(&self) -> bool {
        self.controller.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn is_publishing(&self) -> bool {
        self.is_publishing
    }

    pub fn view(&self) -> EditorView {
        self.view
    }

    pub fn preview(&self) -> &PreviewScheduler {
        &self.preview
    }

    fn schema(&self) -> VariablesSchema {
        self.controller.draft().variables_schema.clone()
    }

    fn edit_schema<F>(&mut self, edit: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut VariablesSchema) -> Result<(), SchemaError>,
    {
        let mut schema = self.schema();
        edit(&mut schema)?;
        self.update_draft_field(DraftUpdate::VariablesSchema(schema));
        Ok(())
    }

    fn refresh_preview(&mut self) {
        let variables = self.controller.preview_variables();
        self.preview.schedule(self.controller.draft(), variables);
    }
}
