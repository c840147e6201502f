//! Model catalog shown in the settings screen.

use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::ports::CredentialPort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub available: bool,
}

pub struct ListModels {
    credentials: Arc<dyn CredentialPort>,
}

impl ListModels {
    pub fn new(credentials: Arc<dyn CredentialPort>) -> Self {
        Self { credentials }
    }

    /// Offline is always available; the primary model needs a key.
    pub fn execute(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "offline",
                name: "Offline Narrator",
                available: true,
            },
            ModelInfo {
                id: "primary",
                name: "Google Gemini",
                available: self.credentials.has_credential(),
            },
            ModelInfo {
                id: "openai",
                name: "OpenAI GPT-4",
                available: false,
            },
        ]
    }
}
