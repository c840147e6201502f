//! Turn orchestrator.
//!
//! One call handles one player action and always yields a [`TurnResult`]:
//! - no roll needed: narrate
//! - roll needed, none supplied: describe the stakes and ask for a roll
//! - roll supplied: re-classify the original action and narrate the outcome
//!
//! The orchestrator keeps no state between calls. The caller holds the pending
//! roll and sends the original action text back with the roll result, either
//! by hand through [`TakeTurn::execute`] or with a [`SessionState`] through
//! [`TakeTurn::play`]. Any
//! model failure (missing key, rate limit, timeout, transport or empty output)
//! is replaced by the offline narrator's answer for the same flow.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use mythicbot_domain::{
    ActionJudgment, Character, ChatMessage, Companion, CompanionUtterance, ConversationState,
    EngineSettings, ModelPreference, ModelUsed, PendingRoll, RollOutcome, SessionState, TurnResult,
};

use super::classifier::ActionClassifier;
use super::fallback::FallbackNarrator;
use super::prompts::{build_system_prompt, build_turn_prompt, TurnContext, TurnFlow};
use super::reactions::CompanionReactionSelector;
use super::response_parser::{
    extract_inline_dialogue, parse_turn_response, sanitize_companions, strip_special_tokens,
};
use crate::infrastructure::model_handle::ModelHandle;
use crate::infrastructure::ports::{ClockPort, CredentialPort, LlmError, LlmRequest};
use crate::infrastructure::telemetry::TelemetryLog;

/// Caller-supplied context for one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub character: Character,
    #[serde(default)]
    pub companions: Vec<Companion>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub action: String,
    /// Present only when resolving a pending roll for `action`.
    #[serde(default)]
    pub roll_result: Option<RollOutcome>,
    #[serde(default)]
    pub model: ModelPreference,
}

impl TurnRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }
}

/// Narration and companion lines from the primary model.
struct ModelReply {
    narration: String,
    companions: Vec<CompanionUtterance>,
}

pub struct TakeTurn {
    classifier: Arc<ActionClassifier>,
    model: Arc<ModelHandle>,
    credentials: Arc<dyn CredentialPort>,
    fallback: Arc<FallbackNarrator>,
    reactions: Arc<CompanionReactionSelector>,
    telemetry: Arc<TelemetryLog>,
    clock: Arc<dyn ClockPort>,
    settings: EngineSettings,
}

impl TakeTurn {
    pub fn new(
        classifier: Arc<ActionClassifier>,
        model: Arc<ModelHandle>,
        credentials: Arc<dyn CredentialPort>,
        fallback: Arc<FallbackNarrator>,
        reactions: Arc<CompanionReactionSelector>,
        telemetry: Arc<TelemetryLog>,
        clock: Arc<dyn ClockPort>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            classifier,
            model,
            credentials,
            fallback,
            reactions,
            telemetry,
            clock,
            settings,
        }
    }

    /// Run one turn. Never fails: the worst case is an offline-narrated result.
    pub async fn execute(&self, request: TurnRequest) -> TurnResult {
        let judgment = self
            .classifier
            .classify(&request.action, &request.companions);
        let flow = select_flow(&judgment, request.roll_result.as_ref());

        tracing::debug!(
            flow = flow.as_str(),
            action_type = %judgment.action_type(),
            actor = %judgment.character_name(),
            "Classified player action"
        );

        let ctx = TurnContext {
            character: &request.character,
            companions: &request.companions,
            history: &request.history,
            action: &request.action,
            judgment: &judgment,
            flow,
        };

        let (narration, companions, model_used) = match self.generate(&ctx, request.model).await {
            Some(reply) => (reply.narration, reply.companions, ModelUsed::Primary),
            None => {
                let offline = self.fallback.respond(&ctx);
                (offline.narration, offline.companions, ModelUsed::Fallback)
            }
        };

        let mut result = TurnResult {
            narration,
            roll: None,
            roll_type: judgment.roll_type(),
            action_type: judgment.action_type(),
            requires_roll: false,
            waiting_for_roll: false,
            roll_params: None,
            is_success: None,
            companions,
            model_used,
            timestamp: self.clock.now(),
        };

        match flow {
            TurnFlow::Narrate => {}
            TurnFlow::RequestRoll => {
                result.requires_roll = true;
                result.waiting_for_roll = true;
                result.roll_params = PendingRoll::from_judgment(&judgment, &request.action);
            }
            TurnFlow::Resolve(outcome) => {
                result.requires_roll = true;
                result.roll = Some(outcome.raw);
                result.is_success = Some(outcome.is_success);
            }
        }

        result
    }

    /// Run one turn against a caller-held session and record it there.
    ///
    /// While a roll is pending, a roll result resolves the stored action and
    /// `action` is ignored. A new action without a roll abandons the pending roll.
    pub async fn play(
        &self,
        session: &mut SessionState,
        action: &str,
        roll_result: Option<RollOutcome>,
        model: ModelPreference,
    ) -> TurnResult {
        let action = match (session.conversation_state(), &roll_result) {
            (ConversationState::AwaitingRoll, Some(_)) => session
                .pending_roll
                .as_ref()
                .map_or_else(|| action.to_string(), |pending| pending.action.clone()),
            (ConversationState::AwaitingRoll, None) => {
                tracing::debug!("New action abandons the pending roll");
                session.cancel_pending_roll();
                action.to_string()
            }
            (ConversationState::Idle, _) => action.to_string(),
        };

        let request = TurnRequest {
            character: session.character.clone(),
            companions: session.companions.clone(),
            history: session.recent_history(self.settings.history_window).to_vec(),
            action: action.clone(),
            roll_result,
            model,
        };
        let result = self.execute(request).await;
        session.record_turn(&action, &result);
        result
    }

    /// Ask the primary model. `None` means the offline narrator should answer.
    async fn generate(&self, ctx: &TurnContext<'_>, preference: ModelPreference) -> Option<ModelReply> {
        if !preference.wants_primary(self.credentials.has_credential()) {
            return None;
        }

        let Some(client) = self.credentials.get_credential().and_then(|key| {
            self.model.initialize(&key);
            self.model.current()
        }) else {
            self.record_fallback(ctx.flow, &LlmError::NotConfigured);
            return None;
        };

        self.telemetry.record(
            "ai_request_start",
            json!({ "flow": ctx.flow.as_str(), "actionType": ctx.judgment.action_type() }),
        );

        let structured = self.settings.features.structured_ai_output;
        let request = LlmRequest::prompt(build_turn_prompt(ctx, self.settings.history_window))
            .with_system_prompt(build_system_prompt(ctx.character, ctx.companions, structured))
            .with_temperature(self.settings.temperature)
            .with_sampling(self.settings.top_p, self.settings.top_k)
            .with_max_tokens(Some(self.settings.max_output_tokens));

        match client.generate(request).await {
            Ok(response) => {
                let reply = self.interpret(ctx, &response.content, structured);
                if reply.is_none() {
                    self.record_fallback(
                        ctx.flow,
                        &LlmError::InvalidResponse("empty response".to_string()),
                    );
                }
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, flow = ctx.flow.as_str(), "Primary model failed, using offline narrator");
                self.record_fallback(ctx.flow, &e);
                None
            }
        }
    }

    fn interpret(&self, ctx: &TurnContext<'_>, content: &str, structured: bool) -> Option<ModelReply> {
        let cleaned = strip_special_tokens(content);
        let text = cleaned.trim();
        if text.is_empty() {
            return None;
        }

        let (narration, mut companions) = if structured {
            match parse_turn_response(text) {
                Some(parsed) => {
                    let companions = sanitize_companions(&parsed.companions, ctx.companions);
                    (parsed.narration, companions)
                }
                None => {
                    tracing::debug!("Model output was not structured, using it verbatim");
                    self.telemetry
                        .record("ai_parse_failed", json!({ "flow": ctx.flow.as_str() }));
                    (text.to_string(), Vec::new())
                }
            }
        } else {
            extract_inline_dialogue(text, ctx.companions)
        };

        if narration.trim().is_empty() {
            return None;
        }

        if companions.is_empty() {
            companions = self.backstop_reactions(ctx);
        }

        Some(ModelReply {
            narration,
            companions,
        })
    }

    fn backstop_reactions(&self, ctx: &TurnContext<'_>) -> Vec<CompanionUtterance> {
        let action_type = ctx.judgment.action_type();
        match ctx.flow {
            TurnFlow::Narrate => self.reactions.select(ctx.companions, action_type, None),
            TurnFlow::RequestRoll => self.reactions.select_anticipation(ctx.companions, action_type),
            TurnFlow::Resolve(outcome) => {
                self.reactions
                    .select(ctx.companions, action_type, Some(outcome.is_success))
            }
        }
    }

    fn record_fallback(&self, flow: TurnFlow, error: &LlmError) {
        match error {
            LlmError::RateLimited => self.telemetry.record("ai_rate_limited", json!({})),
            LlmError::Timeout(limit) => self.telemetry.record(
                "ai_timeout",
                json!({ "timeoutMs": limit.as_millis() as u64 }),
            ),
            _ => {}
        }
        self.telemetry.record(
            "ai_fallback",
            json!({ "flow": flow.as_str(), "reason": error.kind(), "error": error.to_string() }),
        );
    }
}

/// Pick the flow for a judgment and an optional roll result.
///
/// A roll result is re-scored against the judged DC. A roll result for an
/// action that needs no roll is ignored and the action is narrated.
pub fn select_flow(judgment: &ActionJudgment, roll_result: Option<&RollOutcome>) -> TurnFlow {
    match (judgment.check(), roll_result) {
        (Some(check), Some(outcome)) => TurnFlow::Resolve(outcome.reconcile(check.dc)),
        (Some(_), None) => TurnFlow::RequestRoll,
        (None, Some(_)) => {
            tracing::debug!("Roll result supplied for an action that needs no roll");
            TurnFlow::Narrate
        }
        (None, None) => TurnFlow::Narrate,
    }
}
