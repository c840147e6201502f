//! Dungeon Master use cases: turn orchestration and adventure openings.

pub mod classifier;
pub mod fallback;
pub mod opening;
pub mod prompts;
pub mod reactions;
pub mod response_parser;
pub mod take_turn;

use std::sync::Arc;

pub use classifier::{ActionClassifier, ClassifierError, KeywordRule, RuleTable};
pub use fallback::{FallbackNarrator, FallbackResponse};
pub use opening::{OpenAdventure, OpeningNarrative, OpeningRequest};
pub use prompts::TurnFlow;
pub use reactions::CompanionReactionSelector;
pub use take_turn::{TakeTurn, TurnRequest};

/// Container for Dungeon Master use cases.
pub struct DungeonMasterUseCases {
    pub take_turn: Arc<TakeTurn>,
    pub open_adventure: Arc<OpenAdventure>,
}

impl DungeonMasterUseCases {
    pub fn new(take_turn: Arc<TakeTurn>, open_adventure: Arc<OpenAdventure>) -> Self {
        Self {
            take_turn,
            open_adventure,
        }
    }
}
