//! Chat history and the persisted session snapshot.
//!
//! History entries are a closed set of message kinds, so renderers and prompt
//! builders match on them exhaustively instead of comparing type strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Adventure, Character, Companion};
use crate::ids::MessageId;
use crate::value_objects::{CompanionUtterance, ModelUsed, PendingRoll, RollType, TurnResult};
use crate::DomainError;

/// Schema version written into every snapshot.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ChatMessage {
    Player {
        id: MessageId,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Narrator {
        id: MessageId,
        text: String,
        roll: Option<u32>,
        roll_type: RollType,
        is_success: Option<bool>,
        model_used: ModelUsed,
        timestamp: DateTime<Utc>,
    },
    Companion {
        id: MessageId,
        #[serde(flatten)]
        utterance: CompanionUtterance,
        timestamp: DateTime<Utc>,
    },
}

impl ChatMessage {
    pub fn player(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::Player {
            id: MessageId::new(),
            text: text.into(),
            timestamp,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Player { text, .. } | Self::Narrator { text, .. } => text,
            Self::Companion { utterance, .. } => &utterance.text,
        }
    }

    /// Who said it, as shown in prompt transcripts.
    pub fn speaker(&self) -> &str {
        match self {
            Self::Player { .. } => "PLAYER",
            Self::Narrator { .. } => "DM",
            Self::Companion { utterance, .. } => &utterance.companion_name,
        }
    }

    /// Messages to append for a completed turn: the action, the narration, then companion lines.
    pub fn from_turn(action: &str, result: &TurnResult) -> Vec<Self> {
        let mut messages = Vec::with_capacity(2 + result.companions.len());
        messages.push(Self::player(action, result.timestamp));
        messages.push(Self::Narrator {
            id: MessageId::new(),
            text: result.narration.clone(),
            roll: result.roll,
            roll_type: result.roll_type,
            is_success: result.is_success,
            model_used: result.model_used,
            timestamp: result.timestamp,
        });
        messages.extend(result.companions.iter().map(|utterance| Self::Companion {
            id: MessageId::new(),
            utterance: utterance.clone(),
            timestamp: result.timestamp,
        }));
        messages
    }
}

/// Whether the conversation can take a new free action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversationState {
    Idle,
    AwaitingRoll,
}

/// Everything the caller keeps between turns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub character: Character,
    pub companions: Vec<Companion>,
    pub adventure: Option<Adventure>,
    pub history: Vec<ChatMessage>,
    pub pending_roll: Option<PendingRoll>,
}

impl SessionState {
    pub fn conversation_state(&self) -> ConversationState {
        if self.pending_roll.is_some() {
            ConversationState::AwaitingRoll
        } else {
            ConversationState::Idle
        }
    }

    /// Append a finished turn and move between idle and awaiting-roll.
    pub fn record_turn(&mut self, action: &str, result: &TurnResult) {
        self.history.extend(ChatMessage::from_turn(action, result));
        if result.waiting_for_roll {
            self.pending_roll = result.roll_params.clone();
        } else {
            self.pending_roll = None;
        }
    }

    pub fn cancel_pending_roll(&mut self) {
        self.pending_roll = None;
    }

    /// The last `window` history entries, oldest first.
    pub fn recent_history(&self, window: usize) -> &[ChatMessage] {
        recent_messages(&self.history, window)
    }
}

/// The last `window` entries of `history`, oldest first.
pub fn recent_messages(history: &[ChatMessage], window: usize) -> &[ChatMessage] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Versioned wrapper the client persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: u32,
    pub state: SessionState,
}

impl SessionSnapshot {
    pub fn new(state: SessionState) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            state,
        }
    }

    /// Unwrap the state, refusing snapshots written by a different schema.
    pub fn into_state(self) -> Result<SessionState, DomainError> {
        if self.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(DomainError::validation(format!(
                "Unsupported snapshot schema version {} (expected {})",
                self.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Personality;
    use crate::value_objects::{Ability, ActionType, Actor};

    fn lyra() -> Companion {
        Companion::new("Lyra", "elf", "rogue", Personality::Mischievous)
    }

    fn waiting_result() -> TurnResult {
        TurnResult {
            narration: "Roll for it.".into(),
            roll: None,
            roll_type: RollType::AttackRoll,
            action_type: ActionType::Combat,
            requires_roll: true,
            waiting_for_roll: true,
            roll_params: Some(PendingRoll {
                roll_type: RollType::AttackRoll,
                ability: Ability::Strength,
                dc: 13,
                action: "I attack the goblin".into(),
                character_name: Actor::Player,
            }),
            is_success: None,
            companions: vec![CompanionUtterance::new(&lyra(), "Dibs on their loot!")],
            model_used: ModelUsed::Fallback,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_from_turn_orders_messages() {
        let messages = ChatMessage::from_turn("I attack the goblin", &waiting_result());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].speaker(), "PLAYER");
        assert_eq!(messages[1].speaker(), "DM");
        assert_eq!(messages[2].speaker(), "Lyra");
        assert_eq!(messages[2].text(), "Dibs on their loot!");
    }

    #[test]
    fn test_record_turn_tracks_pending_roll() {
        let mut state = SessionState::default();
        state.record_turn("I attack the goblin", &waiting_result());
        assert_eq!(state.conversation_state(), ConversationState::AwaitingRoll);

        let mut resolved = waiting_result();
        resolved.waiting_for_roll = false;
        resolved.roll_params = None;
        resolved.roll = Some(15);
        resolved.is_success = Some(true);
        state.record_turn("I attack the goblin", &resolved);
        assert_eq!(state.conversation_state(), ConversationState::Idle);
        assert_eq!(state.history.len(), 6);
    }

    #[test]
    fn test_recent_history_window() {
        let mut state = SessionState::default();
        for i in 0..10 {
            state.history.push(ChatMessage::player(format!("{i}"), Utc::now()));
        }
        let recent = state.recent_history(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].text(), "4");
    }

    #[test]
    fn test_recent_messages_window_larger_than_history() {
        let history = vec![ChatMessage::player("only", Utc::now())];
        assert_eq!(recent_messages(&history, 6).len(), 1);
        assert!(recent_messages(&history, 0).is_empty());
        assert!(recent_messages(&[], 6).is_empty());
    }

    #[test]
    fn test_cancel_pending_roll_returns_to_idle() {
        let mut state = SessionState::default();
        state.record_turn("I attack the goblin", &waiting_result());
        state.cancel_pending_roll();
        assert_eq!(state.conversation_state(), ConversationState::Idle);
        assert!(state.pending_roll.is_none());
    }

    #[test]
    fn test_snapshot_round_trips_without_loss() {
        let mut state = SessionState {
            companions: vec![lyra()],
            ..Default::default()
        };
        state.record_turn("I attack the goblin", &waiting_result());
        let snapshot = SessionSnapshot::new(state.clone());

        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"type\":\"companion\""));
        assert!(json.contains("\"companionName\":\"Lyra\""));

        let back: SessionSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.into_state().expect("current schema"), state);
    }

    #[test]
    fn test_snapshot_rejects_other_schema() {
        let snapshot = SessionSnapshot {
            schema_version: 99,
            state: SessionState::default(),
        };
        assert!(snapshot.into_state().is_err());
    }
}
