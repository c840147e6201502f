//! API key management: validate, store and clear the primary model credential.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::model_handle::{LlmFactory, ModelHandle};
use crate::infrastructure::ports::{CredentialPort, LlmError, LlmRequest};
use crate::infrastructure::telemetry::TelemetryLog;

/// Prefix every Gemini API key starts with.
pub const KEY_PREFIX: &str = "AIza";

/// Minimal request used to prove a key works.
pub const KEY_CHECK_PROMPT: &str = "Say \"ok\" and nothing else.";

/// User-actionable credential failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("API key cannot be empty")]
    Empty,
    #[error("Invalid API key format. Gemini API keys start with \"AIza\"")]
    BadFormat,
    #[error("Invalid API key. Please check and try again.")]
    InvalidKey,
    #[error("API quota exceeded. The key is valid but has reached its limit.")]
    QuotaExceeded,
    #[error("Permission denied. Make sure the Generative Language API is enabled.")]
    PermissionDenied,
    #[error("API key validation failed - no response received")]
    NoResponse,
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl CredentialError {
    /// Map a provider error to the message shown to the user.
    pub fn from_provider(error: &LlmError) -> Self {
        let message = error.to_string();
        if message.contains("API_KEY_INVALID") {
            Self::InvalidKey
        } else if message.contains("QUOTA_EXCEEDED") || message.contains("RESOURCE_EXHAUSTED") {
            Self::QuotaExceeded
        } else if message.contains("PERMISSION_DENIED") {
            Self::PermissionDenied
        } else {
            Self::ValidationFailed(message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub configured: bool,
}

pub struct ManageCredential {
    store: Arc<dyn CredentialPort>,
    model: Arc<ModelHandle>,
    /// Builds the client used for the live key check.
    key_check: LlmFactory,
    telemetry: Arc<TelemetryLog>,
}

impl ManageCredential {
    pub fn new(
        store: Arc<dyn CredentialPort>,
        model: Arc<ModelHandle>,
        key_check: LlmFactory,
        telemetry: Arc<TelemetryLog>,
    ) -> Self {
        Self {
            store,
            model,
            key_check,
            telemetry,
        }
    }

    pub fn status(&self) -> CredentialStatus {
        CredentialStatus {
            configured: self.store.has_credential(),
        }
    }

    /// Check format, then make a minimal live request with the key.
    pub async fn validate(&self, key: &str) -> Result<(), CredentialError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialError::Empty);
        }
        if !key.starts_with(KEY_PREFIX) {
            return Err(CredentialError::BadFormat);
        }

        let client = (self.key_check)(key);
        let request = LlmRequest::prompt(KEY_CHECK_PROMPT).with_max_tokens(Some(8));
        match client.generate(request).await {
            Ok(response) if !response.content.trim().is_empty() => Ok(()),
            Ok(_) => Err(CredentialError::NoResponse),
            Err(e) => {
                tracing::warn!(error = %e, "API key validation failed");
                Err(CredentialError::from_provider(&e))
            }
        }
    }

    /// Validate and store a key, then bind the model handle to it.
    pub async fn set(&self, key: &str) -> Result<CredentialStatus, CredentialError> {
        self.validate(key).await?;

        let key = key.trim();
        self.store.set_credential(key.to_string());
        let rebound = self.model.initialize(key);
        self.telemetry
            .record("credential_changed", json!({ "action": "set", "rebound": rebound }));
        Ok(self.status())
    }

    pub fn clear(&self) -> CredentialStatus {
        self.store.clear_credential();
        self.model.reset();
        self.telemetry
            .record("credential_changed", json!({ "action": "clear" }));
        self.status()
    }
}
