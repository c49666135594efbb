use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Lifecycle of a draft relative to its persisted baseline.
///
/// `Loaded` covers both a fresh load and a completed save. Any field write
/// moves to `Editing`; only a commit or a reset leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftState {
    #[default]
    Uninitialized,
    Loaded,
    Editing,
}

impl DraftState {
    pub fn is_dirty(&self) -> bool {
        *self == DraftState::Editing
    }
}

impl Display for DraftState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DraftState::Uninitialized => write!(f, "uninitialized"),
            DraftState::Loaded => write!(f, "loaded"),
            DraftState::Editing => write!(f, "editing"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorView {
    #[default]
    Code,
    Preview,
}
