//! Dice use cases.

use std::sync::Arc;

use mythicbot_domain::{Character, DieRoll, PendingRoll, RollOutcome, D20};

use crate::infrastructure::ports::{ClockPort, RandomPort};

/// Dice the table supports.
pub const STANDARD_DICE: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("Unsupported die: d{0}")]
    UnsupportedDie(u32),
}

/// Roll a single standard die.
pub struct RollDie {
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl RollDie {
    pub fn new(random: Arc<dyn RandomPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { random, clock }
    }

    pub fn execute(&self, sides: u32) -> Result<DieRoll, DiceError> {
        if !STANDARD_DICE.contains(&sides) {
            return Err(DiceError::UnsupportedDie(sides));
        }
        let value = self.random.gen_range(1, sides as i32).clamp(1, sides as i32) as u32;
        Ok(DieRoll::new(value, sides, self.clock.now()))
    }

    /// Roll a d20 for a pending roll.
    ///
    /// The player's ability modifier applies; companions carry no stats and roll flat.
    pub fn roll_check(&self, pending: &PendingRoll, character: &Character) -> RollOutcome {
        let raw = self.random.gen_range(1, D20 as i32).clamp(1, D20 as i32) as u32;
        let modifier = if pending.character_name.is_player() {
            character.ability_modifier(pending.ability)
        } else {
            0
        };
        RollOutcome::evaluate(raw, modifier, pending.dc)
    }
}

/// Container for dice use cases.
pub struct DiceUseCases {
    pub roll_die: Arc<RollDie>,
}

impl DiceUseCases {
    pub fn new(roll_die: Arc<RollDie>) -> Self {
        Self { roll_die }
    }
}
