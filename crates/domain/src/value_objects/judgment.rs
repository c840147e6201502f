//! Action judgment - the classifier's verdict on a free-text player action.
//!
//! A judgment either carries a [`DifficultyCheck`] (the action needs a roll)
//! or it does not. Ability and DC travel together so the roll requirement can
//! never disagree with them; the wire format still exposes the flat
//! `requiresRoll` / `ability` / `dc` fields and is validated on the way in.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Ability;
use crate::DomainError;

/// Kind of roll a judgment asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollType {
    AbilityCheck,
    AttackRoll,
    SavingThrow,
    DamageRoll,
    NoRoll,
}

impl RollType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AbilityCheck => "ability_check",
            Self::AttackRoll => "attack_roll",
            Self::SavingThrow => "saving_throw",
            Self::DamageRoll => "damage_roll",
            Self::NoRoll => "no_roll",
        }
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad category of an action, used for narration tone and companion lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Combat,
    Exploration,
    Interaction,
    Trivial,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Exploration => "exploration",
            Self::Interaction => "interaction",
            Self::Trivial => "trivial",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who performs an action: the player character or a named companion.
///
/// Serialized as the plain string `"player"` or the companion's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Actor {
    #[default]
    Player,
    Companion(String),
}

impl Actor {
    pub const PLAYER: &'static str = "player";

    pub fn name(&self) -> &str {
        match self {
            Self::Player => Self::PLAYER,
            Self::Companion(name) => name,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}

impl From<String> for Actor {
    fn from(value: String) -> Self {
        if value.is_empty() || value == Self::PLAYER {
            Self::Player
        } else {
            Self::Companion(value)
        }
    }
}

impl From<Actor> for String {
    fn from(value: Actor) -> Self {
        match value {
            Actor::Player => Actor::PLAYER.to_string(),
            Actor::Companion(name) => name,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ability and difficulty class a rolled action is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DifficultyCheck {
    pub ability: Ability,
    pub dc: u32,
}

/// Classifier output for one player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "JudgmentWire", try_from = "JudgmentWire")]
pub struct ActionJudgment {
    roll_type: RollType,
    action_type: ActionType,
    check: Option<DifficultyCheck>,
    character_name: Actor,
}

impl ActionJudgment {
    /// An action that resolves without dice.
    pub fn no_roll(action_type: ActionType) -> Self {
        Self {
            roll_type: RollType::NoRoll,
            action_type,
            check: None,
            character_name: Actor::Player,
        }
    }

    /// An action that must be rolled for.
    pub fn with_check(
        roll_type: RollType,
        action_type: ActionType,
        ability: Ability,
        dc: u32,
    ) -> Self {
        Self {
            roll_type,
            action_type,
            check: Some(DifficultyCheck { ability, dc }),
            character_name: Actor::Player,
        }
    }

    /// Sets who performs the action.
    pub fn performed_by(mut self, actor: Actor) -> Self {
        self.character_name = actor;
        self
    }

    pub fn requires_roll(&self) -> bool {
        self.check.is_some()
    }

    pub fn roll_type(&self) -> RollType {
        self.roll_type
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn check(&self) -> Option<DifficultyCheck> {
        self.check
    }

    pub fn ability(&self) -> Option<Ability> {
        self.check.map(|c| c.ability)
    }

    pub fn dc(&self) -> Option<u32> {
        self.check.map(|c| c.dc)
    }

    pub fn character_name(&self) -> &Actor {
        &self.character_name
    }

    /// Label shown next to a roll, e.g. "Attack Roll" or "Wisdom Check".
    pub fn roll_label(&self) -> String {
        match (self.roll_type, self.ability()) {
            (RollType::AttackRoll, _) => "Attack Roll".to_string(),
            (RollType::SavingThrow, Some(ability)) => {
                format!("{} Saving Throw", ability.display_name())
            }
            (_, Some(ability)) => format!("{} Check", ability.display_name()),
            (_, None) => "No Roll".to_string(),
        }
    }
}

/// Flat wire shape of a judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgmentWire {
    requires_roll: bool,
    roll_type: RollType,
    action_type: ActionType,
    #[serde(default)]
    ability: Option<Ability>,
    #[serde(default)]
    dc: Option<u32>,
    #[serde(default)]
    character_name: Actor,
}

impl From<ActionJudgment> for JudgmentWire {
    fn from(value: ActionJudgment) -> Self {
        Self {
            requires_roll: value.requires_roll(),
            roll_type: value.roll_type,
            action_type: value.action_type,
            ability: value.ability(),
            dc: value.dc(),
            character_name: value.character_name,
        }
    }
}

impl TryFrom<JudgmentWire> for ActionJudgment {
    type Error = DomainError;

    fn try_from(wire: JudgmentWire) -> Result<Self, Self::Error> {
        let check = match (wire.requires_roll, wire.ability, wire.dc) {
            (true, Some(ability), Some(dc)) => Some(DifficultyCheck { ability, dc }),
            (false, None, None) => None,
            (true, _, _) => {
                return Err(DomainError::constraint(
                    "a judgment requiring a roll needs both ability and dc",
                ))
            }
            (false, _, _) => {
                return Err(DomainError::constraint(
                    "a judgment without a roll cannot carry ability or dc",
                ))
            }
        };

        Ok(Self {
            roll_type: wire.roll_type,
            action_type: wire.action_type,
            check,
            character_name: wire.character_name,
        })
    }
}
