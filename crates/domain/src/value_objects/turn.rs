//! Turn value objects - what the orchestrator hands back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Ability, ActionJudgment, ActionType, Actor, RollType};
use crate::entities::{Companion, Personality};

/// A roll the caller must collect before the action can be resolved.
///
/// Held by the caller between the request-roll turn and the resolution turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRoll {
    pub roll_type: RollType,
    pub ability: Ability,
    pub dc: u32,
    pub action: String,
    pub character_name: Actor,
}

impl PendingRoll {
    /// Build the pending roll for a judgment, or `None` when no roll is needed.
    pub fn from_judgment(judgment: &ActionJudgment, action: impl Into<String>) -> Option<Self> {
        judgment.check().map(|check| Self {
            roll_type: judgment.roll_type(),
            ability: check.ability,
            dc: check.dc,
            action: action.into(),
            character_name: judgment.character_name().clone(),
        })
    }
}

/// A line of dialogue spoken by a companion this turn.
///
/// Race, class and personality always come from the roster, never from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionUtterance {
    pub companion_name: String,
    pub companion_race: String,
    pub companion_class: String,
    pub personality: Personality,
    pub text: String,
}

impl CompanionUtterance {
    pub fn new(companion: &Companion, text: impl Into<String>) -> Self {
        Self {
            companion_name: companion.name.clone(),
            companion_race: companion.race.clone(),
            companion_class: companion.class.clone(),
            personality: companion.personality,
            text: text.into(),
        }
    }
}

/// Which backend produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelUsed {
    Primary,
    Fallback,
}

impl fmt::Display for ModelUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Caller's choice of backend.
///
/// `Auto` tries the primary model when a credential exists and goes offline otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreference {
    #[default]
    Auto,
    #[serde(alias = "gemini")]
    Primary,
    #[serde(alias = "mock")]
    Offline,
}

impl ModelPreference {
    /// Whether the primary model should be attempted given credential availability.
    pub fn wants_primary(&self, has_credential: bool) -> bool {
        match self {
            Self::Auto | Self::Primary => has_credential,
            Self::Offline => false,
        }
    }
}

/// Uniform result of one orchestrator invocation.
///
/// Created fresh per turn and never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub narration: String,
    /// Raw die value, present on resolution turns.
    pub roll: Option<u32>,
    pub roll_type: RollType,
    pub action_type: ActionType,
    pub requires_roll: bool,
    pub waiting_for_roll: bool,
    pub roll_params: Option<PendingRoll>,
    pub is_success: Option<bool>,
    pub companions: Vec<CompanionUtterance>,
    pub model_used: ModelUsed,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_roll_only_for_rolled_judgments() {
        let trivial = ActionJudgment::no_roll(ActionType::Trivial);
        assert!(PendingRoll::from_judgment(&trivial, "look around").is_none());

        let attack = ActionJudgment::with_check(
            RollType::AttackRoll,
            ActionType::Combat,
            Ability::Strength,
            13,
        );
        let pending = PendingRoll::from_judgment(&attack, "I attack the goblin")
            .expect("attack needs a roll");
        assert_eq!(pending.dc, 13);
        assert_eq!(pending.ability, Ability::Strength);
        assert_eq!(pending.character_name, Actor::Player);
    }

    #[test]
    fn test_model_preference_accepts_legacy_names() {
        let primary: ModelPreference = serde_json::from_str("\"gemini\"").expect("alias");
        let offline: ModelPreference = serde_json::from_str("\"mock\"").expect("alias");
        assert_eq!(primary, ModelPreference::Primary);
        assert_eq!(offline, ModelPreference::Offline);
    }

    #[test]
    fn test_auto_needs_a_credential() {
        assert!(ModelPreference::Auto.wants_primary(true));
        assert!(!ModelPreference::Auto.wants_primary(false));
        assert!(!ModelPreference::Offline.wants_primary(true));
    }

    #[test]
    fn test_turn_result_serializes_camel_case() {
        let result = TurnResult {
            narration: "The goblin staggers.".into(),
            roll: Some(15),
            roll_type: RollType::AttackRoll,
            action_type: ActionType::Combat,
            requires_roll: true,
            waiting_for_roll: false,
            roll_params: None,
            is_success: Some(true),
            companions: vec![],
            model_used: ModelUsed::Fallback,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["waitingForRoll"], false);
        assert_eq!(value["modelUsed"], "fallback");
        assert_eq!(value["rollType"], "attack_roll");

        let back: TurnResult = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, result);
    }
}
