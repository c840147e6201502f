//! MythicBot domain types.
//!
//! Pure data and invariants for the Dungeon Master engine: characters and
//! companions, action judgments, roll outcomes, turn results and the chat
//! history they produce. Nothing here performs I/O or draws random numbers.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    recent_messages, validate_roster, AbilityScores, Adventure, Character, ChatMessage, Companion,
    ConversationState, Personality, SessionSnapshot, SessionState, CURRENT_SCHEMA_VERSION,
    MAX_COMPANIONS,
};
pub use error::DomainError;
pub use ids::MessageId;
pub use value_objects::{
    ability_modifier, dc_as_total, Ability, ActionJudgment, ActionType, Actor, CompanionUtterance,
    DieRoll, DifficultyCheck, EngineSettings, FeatureFlags, ModelPreference, ModelUsed,
    OutcomeTier, PendingRoll, RollOutcome, RollType, TurnResult, D20,
};
