//! Settings use cases: credential management and the model catalog.

mod credential;
mod models;

use std::sync::Arc;

pub use credential::{
    CredentialError, CredentialStatus, ManageCredential, KEY_CHECK_PROMPT, KEY_PREFIX,
};
pub use models::{ListModels, ModelInfo};

/// Container for settings use cases.
pub struct SettingsUseCases {
    pub credential: Arc<ManageCredential>,
    pub models: Arc<ListModels>,
}

impl SettingsUseCases {
    pub fn new(credential: Arc<ManageCredential>, models: Arc<ListModels>) -> Self {
        Self { credential, models }
    }
}
