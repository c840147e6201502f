//! Value objects - Immutable objects defined by their attributes

mod ability;
mod dice;
mod judgment;
mod settings;
mod turn;

pub use ability::{ability_modifier, Ability};
pub use dice::{dc_as_total, DieRoll, OutcomeTier, RollOutcome, D20};
pub use judgment::{ActionJudgment, ActionType, Actor, DifficultyCheck, RollType};
pub use settings::{EngineSettings, FeatureFlags};
pub use turn::{CompanionUtterance, ModelPreference, ModelUsed, PendingRoll, TurnResult};
