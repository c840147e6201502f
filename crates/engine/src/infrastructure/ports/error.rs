//! Error types for port operations.

use std::time::Duration;

/// Language model call failures.
///
/// Every variant is recoverable at the turn level: the orchestrator swaps in
/// the offline narrator instead of surfacing these to the player.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The sliding-window limiter refused the request before it left the process.
    #[error("LLM request rejected by rate limiter")]
    RateLimited,
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
    /// No credential-bound model is available.
    #[error("LLM not configured")]
    NotConfigured,
}

impl LlmError {
    /// Short tag used in logs and telemetry metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestFailed(_) => "request_failed",
            Self::InvalidResponse(_) => "invalid_response",
            Self::RateLimited => "rate_limited",
            Self::Timeout(_) => "timeout",
            Self::NotConfigured => "not_configured",
        }
    }
}
