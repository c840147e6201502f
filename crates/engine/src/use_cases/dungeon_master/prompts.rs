//! Prompt construction for Dungeon Master turns.
//!
//! The system prompt carries the persona, the party and the output format; the
//! user prompt carries recent history, the action and a block describing the
//! current flow (narrate, request a roll, or resolve a roll).

use mythicbot_domain::{
    recent_messages, Ability, ActionJudgment, Adventure, Character, ChatMessage, Companion,
    RollOutcome,
};

/// What a turn is doing. The pending roll itself is re-derived from the judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFlow {
    /// No roll needed: just narrate.
    Narrate,
    /// Describe the stakes and pause for a roll.
    RequestRoll,
    /// A roll came back: narrate the outcome.
    Resolve(RollOutcome),
}

impl TurnFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrate => "narrate",
            Self::RequestRoll => "request_roll",
            Self::Resolve(_) => "resolve",
        }
    }
}

/// Everything needed to render one turn, borrowed from the request.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub character: &'a Character,
    pub companions: &'a [Companion],
    pub history: &'a [ChatMessage],
    pub action: &'a str,
    pub judgment: &'a ActionJudgment,
    pub flow: TurnFlow,
}

impl TurnContext<'_> {
    /// Display name of whoever is acting.
    pub fn actor_name(&self) -> &str {
        if self.judgment.character_name().is_player() {
            &self.character.name
        } else {
            self.judgment.character_name().name()
        }
    }
}

pub const DM_PERSONA: &str = "You are an exceptional Dungeon Master running a D&D 5th Edition campaign. \
You are a master storyteller who brings worlds to life with vivid prose, dramatic tension, and unforgettable moments.

## YOUR DUNGEON MASTER PHILOSOPHY
- **Immersion First**: Make the player FEEL like they are in the world. Engage all five senses.
- **Dramatic Storytelling**: Build tension, use pacing, create memorable moments and callbacks to previous events.
- **Player Agency**: Honor player choices. Their actions matter and have consequences.
- **Living World**: NPCs have goals, fears, and motivations.

## D&D 5E RULES TO FOLLOW
- Natural 20 = Critical Success (describe something EPIC happening)
- Natural 1 = Critical Failure (describe a dramatic mishap, but keep it fun, not punishing)
- Class features and race traits matter: weave them into descriptions";

pub const COMPANION_VOICE: &str = "When companions speak, their dialogue should:
- Reflect their personality trait (a Sarcastic character snipes, a Cheerful one encourages)
- Show their class background (a Wizard references arcana, a Fighter discusses tactics)
- React authentically to success/failure";

pub const STRUCTURED_OUTPUT_FORMAT: &str = r#"## RESPONSE FORMAT
Respond with ONLY a JSON object, no prose before or after it:
{"narration": "2-4 paragraphs of Dungeon Master narration", "companions": [{"name": "CompanionName", "dialogue": "What they say"}]}
- "name" must be exactly one of the companion names listed above
- Use an empty "companions" array when nobody speaks
- Do NOT put companion dialogue inside "narration""#;

pub const INLINE_OUTPUT_FORMAT: &str = r#"## RESPONSE FORMAT
Write 2-4 paragraphs of narration.
Format companion dialogue on its own line as: **CompanionName**: "Their dialogue here""#;

pub const RESPONSE_RULES: &str = "IMPORTANT RULES:
- Do NOT include dice roll numbers - the UI displays those separately
- Do NOT break character or reference game mechanics directly
- Do NOT railroad - present options, not destinations
- STAY CONCISE - 2-4 punchy paragraphs max
- End with a hook: a new discovery, approaching danger, or a choice to make";

/// System prompt: persona, party and output format.
pub fn build_system_prompt(
    character: &Character,
    companions: &[Companion],
    structured_output: bool,
) -> String {
    let stats = Ability::ALL
        .iter()
        .map(|a| format!("{} {}", a.abbreviation(), character.stats.score(*a)))
        .collect::<Vec<_>>()
        .join(", ");

    let format = if structured_output {
        STRUCTURED_OUTPUT_FORMAT
    } else {
        INLINE_OUTPUT_FORMAT
    };

    format!(
        "{DM_PERSONA}\n\n## CURRENT PARTY\n\
         **Player Character**: {name}, a {race} {class} (level {level})\n\
         - Stats: {stats}\n\
         - Personality: {personality}\n\
         - Background: {background}\n\n\
         **Companions**: {roster}\n{COMPANION_VOICE}\n\n{format}",
        name = character.name,
        race = character.race,
        class = character.class,
        level = character.level,
        personality = or_default(&character.personality, "Brave adventurer"),
        background = or_default(&character.background, "Unknown origins"),
        roster = describe_roster(companions),
    )
}

/// User prompt for one turn.
pub fn build_turn_prompt(ctx: &TurnContext<'_>, history_window: usize) -> String {
    format!(
        "## RECENT EVENTS\n{history}\n\n## CURRENT ACTION\n{speaker} says: \"{action}\"\n\n{flow}\n\n{RESPONSE_RULES}",
        history = render_history(ctx.history, history_window),
        speaker = if ctx.judgment.character_name().is_player() {
            "The player"
        } else {
            ctx.actor_name()
        },
        action = ctx.action,
        flow = flow_block(ctx),
    )
}

/// Prompt for the opening narration of an adventure.
pub fn build_opening_prompt(adventure: &Adventure, character: &Character) -> String {
    format!(
        "You are an exceptional Dungeon Master beginning an epic D&D 5th Edition adventure. \
         Create a CINEMATIC opening that will hook the player immediately.\n\n\
         Adventure: {name}\nSetting: {setting}\nDescription: {description}\n\n\
         Player Character: {character}, a {race} {class}\n\
         Personality: {personality}\nBackground: {background}\n\n\
         Write an epic opening narration (2-3 paragraphs) that:\n\
         1. **HOOK IMMEDIATELY**: Start with action, tension, or mystery - NOT \"You find yourself...\"\n\
         2. **ENGAGE ALL SENSES**: Include at least 3 sensory details\n\
         3. **PERSONALIZE**: Reference the character's race or class in the scene naturally\n\
         4. **HINT AT STAKES**: Something is wrong, something needs doing, danger lurks\n\
         5. **END WITH AGENCY**: Finish with an open question or choice that demands player action\n\n\
         Respond with the narration only.",
        name = or_default(&adventure.name, "A New Beginning"),
        setting = or_default(&adventure.setting, "A fantastical realm"),
        description = or_default(&adventure.description, "An epic journey awaits"),
        character = or_default(&character.name, "A brave adventurer"),
        race = or_default(&character.race, "human"),
        class = or_default(&character.class, "fighter"),
        personality = or_default(&character.personality, "Courageous and determined"),
        background = or_default(&character.background, "Mysterious origins"),
    )
}

fn flow_block(ctx: &TurnContext<'_>) -> String {
    let judgment = ctx.judgment;
    match (ctx.flow, judgment.check()) {
        (TurnFlow::RequestRoll, Some(check)) => format!(
            "**ROLL REQUIRED**: This action calls for a {label} (DC {dc}) from {actor}. \
             Set the scene and build tension up to the moment of the attempt, then stop and ask \
             {actor} to roll a d20. Do NOT decide or describe the outcome yet.",
            label = judgment.roll_label(),
            dc = check.dc,
            actor = ctx.actor_name(),
        ),
        (TurnFlow::Resolve(outcome), Some(check)) => {
            let sign = if outcome.modifier >= 0 { "+" } else { "" };
            let critical = if outcome.is_critical_success() {
                " (CRITICAL SUCCESS!)"
            } else if outcome.is_critical_failure() {
                " (CRITICAL FAILURE!)"
            } else {
                ""
            };
            format!(
                "**DICE ROLL RESULT**: {actor} rolled a d20 for a {label} and got {raw}{sign}{modifier} = {total} \
                 against DC {dc}. Result: {result}{critical}\n\
                 Narrate the consequences of this outcome.",
                actor = ctx.actor_name(),
                label = judgment.roll_label(),
                raw = outcome.raw,
                modifier = outcome.modifier,
                total = outcome.total,
                dc = check.dc,
                result = if outcome.is_success { "SUCCESS" } else { "FAILURE" },
            )
        }
        _ => "**NO ROLL NEEDED**: This action succeeds automatically. Narrate what happens.".to_string(),
    }
}

fn describe_roster(companions: &[Companion]) -> String {
    if companions.is_empty() {
        return "None".to_string();
    }
    companions
        .iter()
        .map(|c| format!("{} ({} {}, {} personality)", c.name, c.race, c.class, c.personality.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_history(history: &[ChatMessage], window: usize) -> String {
    let recent = recent_messages(history, window);
    if recent.is_empty() {
        return "The adventure has just begun.".to_string();
    }
    recent
        .iter()
        .map(|m| format!("{}: {}", m.speaker(), m.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mythicbot_domain::{ActionType, Actor, Personality, RollType};

    fn party() -> (Character, Vec<Companion>) {
        let mut character = Character::default();
        character.name = "Thorin".into();
        character.stats.strength = 16;
        let companions = vec![Companion::new("Lyra", "elf", "rogue", Personality::Sarcastic)];
        (character, companions)
    }

    fn attack() -> ActionJudgment {
        ActionJudgment::with_check(RollType::AttackRoll, ActionType::Combat, Ability::Strength, 13)
    }

    #[test]
    fn test_system_prompt_describes_party_and_format() {
        let (character, companions) = party();
        let prompt = build_system_prompt(&character, &companions, true);
        assert!(prompt.contains("Thorin, a human fighter"));
        assert!(prompt.contains("STR 16"));
        assert!(prompt.contains("Lyra (elf rogue, Sarcastic personality)"));
        assert!(prompt.contains(r#""companions": [{"name""#));

        let inline = build_system_prompt(&character, &[], false);
        assert!(inline.contains("**Companions**: None"));
        assert!(inline.contains("**CompanionName**:"));
    }

    #[test]
    fn test_history_window_keeps_most_recent() {
        let (character, companions) = party();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid timestamp");
        let history: Vec<_> = (0..10)
            .map(|i| ChatMessage::player(format!("action {i}"), at))
            .collect();
        let judgment = ActionJudgment::no_roll(ActionType::Trivial);
        let ctx = TurnContext {
            character: &character,
            companions: &companions,
            history: &history,
            action: "look around",
            judgment: &judgment,
            flow: TurnFlow::Narrate,
        };
        let prompt = build_turn_prompt(&ctx, 6);
        assert!(!prompt.contains("action 3"));
        assert!(prompt.contains("PLAYER: action 4"));
        assert!(prompt.contains("PLAYER: action 9"));
        assert!(prompt.contains("NO ROLL NEEDED"));
    }

    #[test]
    fn test_empty_history_reads_as_beginning() {
        let (character, companions) = party();
        let judgment = ActionJudgment::no_roll(ActionType::Exploration);
        let ctx = TurnContext {
            character: &character,
            companions: &companions,
            history: &[],
            action: "I hum",
            judgment: &judgment,
            flow: TurnFlow::Narrate,
        };
        assert!(build_turn_prompt(&ctx, 6).contains("The adventure has just begun."));
    }

    #[test]
    fn test_request_roll_names_actor_and_dc() {
        let (character, companions) = party();
        let judgment = ActionJudgment::with_check(
            RollType::AbilityCheck,
            ActionType::Exploration,
            Ability::Dexterity,
            13,
        )
        .performed_by(Actor::Companion("Lyra".into()));
        let ctx = TurnContext {
            character: &character,
            companions: &companions,
            history: &[],
            action: "sneak past the guard",
            judgment: &judgment,
            flow: TurnFlow::RequestRoll,
        };
        let prompt = build_turn_prompt(&ctx, 6);
        assert!(prompt.contains("Lyra says: \"sneak past the guard\""));
        assert!(prompt.contains("Dexterity Check (DC 13) from Lyra"));
    }

    #[test]
    fn test_resolution_embeds_numbers_and_criticals() {
        let (character, companions) = party();
        let judgment = attack();
        let ctx = TurnContext {
            character: &character,
            companions: &companions,
            history: &[],
            action: "I attack the goblin",
            judgment: &judgment,
            flow: TurnFlow::Resolve(RollOutcome::evaluate(15, 2, 13)),
        };
        let prompt = build_turn_prompt(&ctx, 6);
        assert!(prompt.contains("got 15+2 = 17 against DC 13. Result: SUCCESS"));
        assert!(prompt.contains("Thorin rolled"));

        let ctx = TurnContext {
            flow: TurnFlow::Resolve(RollOutcome::evaluate(1, 5, 3)),
            ..ctx
        };
        let prompt = build_turn_prompt(&ctx, 6);
        assert!(prompt.contains("Result: FAILURE (CRITICAL FAILURE!)"));
    }

    #[test]
    fn test_opening_prompt_uses_defaults_for_blank_fields() {
        let prompt = build_opening_prompt(&Adventure::default(), &Character::default());
        assert!(prompt.contains("Adventure: A New Beginning"));
        assert!(prompt.contains("Adventurer, a human fighter"));
    }
}
