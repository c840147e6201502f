//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - LLM calls (could swap Gemini -> any text-completion service)
//! - Credential storage (env/in-memory today, a keychain tomorrow)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;

pub use error::LlmError;
pub use external::{
    ChatMessage, CredentialPort, FinishReason, LlmPort, LlmRequest, LlmResponse, MessageRole,
    TokenUsage,
};
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use external::{MockCredentialPort, MockLlmPort};
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
