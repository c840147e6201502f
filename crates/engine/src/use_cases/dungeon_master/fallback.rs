//! Offline narrator.
//!
//! Template-based stand-in for the model. Honors the same three flows as the
//! orchestrator and never touches the network, so it is safe to call from any
//! failure path.

use std::sync::Arc;

use mythicbot_domain::{dc_as_total, ActionType, CompanionUtterance, OutcomeTier, RollOutcome};

use super::prompts::{TurnContext, TurnFlow};
use super::reactions::CompanionReactionSelector;
use crate::infrastructure::ports::RandomPort;

const COMBAT_INTROS: [&str; 3] = [
    "The tension rises as combat begins!",
    "Your opponent readies themselves for battle!",
    "Steel glints in the dim light.",
];
const EXPLORATION_INTROS: [&str; 3] = [
    "The world unfolds before you.",
    "Your senses take in the surroundings.",
    "Adventure beckons.",
];
const INTERACTION_INTROS: [&str; 3] = [
    "Eyes meet as conversation begins.",
    "Words carry weight in this moment.",
    "Every word could change your fate.",
];
const TRIVIAL_LINES: [&str; 3] = [
    "You do so without difficulty.",
    "A simple matter.",
    "No challenge presents itself.",
];

/// Narration and companion lines produced offline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    pub narration: String,
    pub companions: Vec<CompanionUtterance>,
}

pub struct FallbackNarrator {
    random: Arc<dyn RandomPort>,
    reactions: Arc<CompanionReactionSelector>,
}

impl FallbackNarrator {
    pub fn new(random: Arc<dyn RandomPort>, reactions: Arc<CompanionReactionSelector>) -> Self {
        Self { random, reactions }
    }

    /// Dispatch on the turn's flow. A roll flow without a check degrades to narration.
    pub fn respond(&self, ctx: &TurnContext<'_>) -> FallbackResponse {
        match (ctx.flow, ctx.judgment.check()) {
            (TurnFlow::RequestRoll, Some(_)) => self.request_roll(ctx),
            (TurnFlow::Resolve(outcome), Some(_)) => self.resolve(ctx, &outcome),
            _ => self.narrate(ctx),
        }
    }

    pub fn narrate(&self, ctx: &TurnContext<'_>) -> FallbackResponse {
        let action_type = ctx.judgment.action_type();
        let narration = format!(
            "{intro}\n\n{who}: \"{action}\"\n\n{line}\n\nWhat would you like to do next?",
            intro = self.pick(intros(action_type)),
            who = self.subject(ctx),
            action = ctx.action,
            line = self.pick(&TRIVIAL_LINES),
        );
        FallbackResponse {
            narration,
            companions: self.reactions.select(ctx.companions, action_type, None),
        }
    }

    pub fn request_roll(&self, ctx: &TurnContext<'_>) -> FallbackResponse {
        let action_type = ctx.judgment.action_type();
        let dc = ctx.judgment.dc().unwrap_or_default();
        let narration = format!(
            "{intro}\n\n{who} attempt{s}: \"{action}\"\n\n**{label}** (DC {dc})\n🎲 {roller}, roll a d20 to see what happens!",
            intro = self.pick(intros(action_type)),
            who = self.subject(ctx),
            s = if ctx.judgment.character_name().is_player() { "" } else { "s" },
            action = ctx.action,
            label = ctx.judgment.roll_label(),
            roller = ctx.actor_name(),
        );
        FallbackResponse {
            narration,
            companions: self.reactions.select_anticipation(ctx.companions, action_type),
        }
    }

    pub fn resolve(&self, ctx: &TurnContext<'_>, outcome: &RollOutcome) -> FallbackResponse {
        let action_type = ctx.judgment.action_type();
        let dc = ctx.judgment.dc().unwrap_or_default();
        let narration = format!(
            "{intro}\n\n{who} attempt{s}: \"{action}\"\n\n**{label}** (DC {dc})\n🎲 Roll: {roll_line}\n\n{result}\n\nWhat do you do next?",
            intro = self.pick(intros(action_type)),
            who = self.subject(ctx),
            s = if ctx.judgment.character_name().is_player() { "" } else { "s" },
            action = ctx.action,
            label = ctx.judgment.roll_label(),
            roll_line = roll_line(outcome),
            result = outcome_line(outcome, dc),
        );
        FallbackResponse {
            narration,
            companions: self
                .reactions
                .select(ctx.companions, action_type, Some(outcome.is_success)),
        }
    }

    fn subject<'a>(&self, ctx: &'a TurnContext<'_>) -> &'a str {
        if ctx.judgment.character_name().is_player() {
            "You"
        } else {
            ctx.judgment.character_name().name()
        }
    }

    fn pick(&self, pool: &[&'static str]) -> &'static str {
        if pool.is_empty() {
            return "";
        }
        let idx = self.random.gen_range(0, pool.len() as i32 - 1);
        pool[(idx.max(0) as usize).min(pool.len() - 1)]
    }
}

fn intros(action_type: ActionType) -> &'static [&'static str] {
    match action_type {
        ActionType::Combat => &COMBAT_INTROS,
        ActionType::Exploration | ActionType::Trivial => &EXPLORATION_INTROS,
        ActionType::Interaction => &INTERACTION_INTROS,
    }
}

/// `15 + 2 = **17**`
fn roll_line(outcome: &RollOutcome) -> String {
    let sign = if outcome.modifier >= 0 { '+' } else { '-' };
    format!(
        "{} {} {} = **{}**",
        outcome.raw,
        sign,
        outcome.modifier.unsigned_abs(),
        outcome.total
    )
}

/// Outcome sentence for a resolved roll.
pub fn outcome_line(outcome: &RollOutcome, dc: u32) -> &'static str {
    let dc = dc_as_total(dc);
    match outcome.tier() {
        OutcomeTier::CriticalSuccess => "CRITICAL SUCCESS!",
        OutcomeTier::CriticalFailure => "CRITICAL FAILURE!",
        OutcomeTier::Success if outcome.total >= dc.saturating_add(5) => "A resounding success!",
        OutcomeTier::Success => "You succeed!",
        OutcomeTier::Failure if outcome.total >= dc.saturating_sub(2) => "So close, yet not enough.",
        OutcomeTier::Failure => "You fail.",
    }
}
