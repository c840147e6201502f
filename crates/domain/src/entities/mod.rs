//! Entities - characters, companions, adventures and the session they live in

mod adventure;
mod character;
mod companion;
mod session;

pub use adventure::Adventure;
pub use character::{AbilityScores, Character};
pub use companion::{validate_roster, Companion, Personality, MAX_COMPANIONS};
pub use session::{
    recent_messages, ChatMessage, ConversationState, SessionSnapshot, SessionState,
    CURRENT_SCHEMA_VERSION,
};
