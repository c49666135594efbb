use thiserror::Error;

use crate::models::draft::DraftField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Missing variable in template: {path}")]
    MissingVariable { path: String },

    #[error("Template syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Variable name cannot be empty")]
    EmptyName,

    #[error("Variable '{0}' is already declared")]
    DuplicateName(String),

    #[error("Variable '{0}' is not declared")]
    UnknownVariable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No template is loaded")]
    NotInitialized,

    #[error("Draft has no unsaved changes")]
    NothingToSave,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("No save is in progress")]
    NoSaveInProgress,

    #[error("Unsaved changes must be saved before publishing")]
    UnsavedChanges,

    #[error("No saved version to publish")]
    NoPersistedVersion,

    #[error("A publish is already in progress")]
    PublishInProgress,

    #[error("No publish is in progress")]
    NoPublishInProgress,

    #[error("Invalid {field}: {source}")]
    InvalidTemplate {
        field: DraftField,
        #[source]
        source: RenderError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Save failed: {0}")]
    SaveFailed(#[source] anyhow::Error),

    #[error("Publish failed: {0}")]
    PublishFailed(#[source] anyhow::Error),
}
