//! Model output parser for Dungeon Master turns.
//!
//! The model is asked for `{"narration": "...", "companions": [{"name", "dialogue"}]}`
//! but often wraps it in a code fence, surrounds it with prose, or gets cut off
//! by the token limit. [`parse_turn_response`] tries each tier in order:
//!
//! 1. the content of a fenced code block
//! 2. the whole text
//! 3. the slice from the first `{` to the last `}`
//! 4. a salvaged `"narration": "...` value, even without its closing quote
//!
//! Tier 4 is a degraded result: narration only, no companions.

use regex_lite::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use mythicbot_domain::{Companion, CompanionUtterance};

/// Structured turn content as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTurn {
    pub narration: String,
    pub companions: Vec<RawCompanionLine>,
    /// True when only the narration could be recovered.
    pub salvaged: bool,
}

/// A companion line as the model wrote it. Not yet checked against the roster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RawCompanionLine {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "text")]
    pub dialogue: String,
}

// Companion entries are checked one by one so a malformed entry or a
// `null` list never costs the narration its structured tier
#[derive(Debug, Deserialize)]
struct TurnPayload {
    narration: String,
    #[serde(default)]
    companions: Option<Vec<serde_json::Value>>,
}

fn companion_lines(entries: Option<Vec<serde_json::Value>>) -> Vec<RawCompanionLine> {
    entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawCompanionLine>(entry).ok())
        .collect()
}

static FENCED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("valid regex"));

// No closing quote required: truncated output still yields the prefix
static NARRATION_SALVAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""narration"\s*:\s*"((?:[^"\\]|\\.)*)"#).expect("valid regex")
});

// Model-specific special tokens that sometimes leak into output
static SPECIAL_TOKENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    // - <|...|> style tokens
    // - [INST], [/INST] (llama)
    // - <<SYS>>, <</SYS>> (llama)
    Regex::new(r"<\|[^|>]+\|>|\[/?INST\]|<</?SYS>>").expect("valid regex")
});

static FINAL_CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|channel\|>final<\|message\|>(.*)$").expect("valid regex"));

/// Remove model-specific special tokens that may leak through from model output.
///
/// For `<|channel|>analysis ... <|channel|>final<|message|>CONTENT` responses only
/// CONTENT is kept.
pub fn strip_special_tokens(raw: &str) -> String {
    if let Some(content) = FINAL_CONTENT_RE.captures(raw).and_then(|caps| caps.get(1)) {
        return SPECIAL_TOKENS_RE
            .replace_all(content.as_str().trim(), "")
            .to_string();
    }
    SPECIAL_TOKENS_RE.replace_all(raw, "").to_string()
}

/// Parse raw model output into narration and companion lines.
///
/// Returns `None` when no tier produces a non-blank narration; the caller then
/// uses the raw text as narration.
pub fn parse_turn_response(raw: &str) -> Option<ParsedTurn> {
    let cleaned = strip_special_tokens(raw);
    let text = cleaned.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(inner) = FENCED_RE.captures(text).and_then(|caps| caps.get(1)) {
        if let Some(parsed) = try_payload(inner.as_str()) {
            return Some(parsed);
        }
    }

    if let Some(parsed) = try_payload(text) {
        return Some(parsed);
    }

    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            if let Some(parsed) = try_payload(&text[first..=last]) {
                return Some(parsed);
            }
        }
    }

    salvage_narration(text)
}

fn try_payload(candidate: &str) -> Option<ParsedTurn> {
    let payload: TurnPayload = serde_json::from_str(candidate.trim()).ok()?;
    if payload.narration.trim().is_empty() {
        return None;
    }
    Some(ParsedTurn {
        narration: payload.narration,
        companions: companion_lines(payload.companions),
        salvaged: false,
    })
}

fn salvage_narration(text: &str) -> Option<ParsedTurn> {
    let narration = NARRATION_SALVAGE_RE.captures(text)?.get(1)?.as_str();
    if narration.trim().is_empty() {
        return None;
    }
    tracing::debug!(len = narration.len(), "Salvaged narration from malformed model output");
    Some(ParsedTurn {
        narration: narration.to_string(),
        companions: Vec::new(),
        salvaged: true,
    })
}

/// Keep only lines spoken by roster members.
///
/// Names match exactly (case-sensitive). Lines with blank dialogue are dropped.
/// Race, class and personality always come from the roster.
pub fn sanitize_companions(
    lines: &[RawCompanionLine],
    roster: &[Companion],
) -> Vec<CompanionUtterance> {
    lines
        .iter()
        .filter_map(|line| {
            let dialogue = line.dialogue.trim();
            if dialogue.is_empty() {
                return None;
            }
            let companion = roster.iter().find(|c| c.name == line.name)?;
            Some(CompanionUtterance::new(companion, dialogue))
        })
        .collect()
}

/// Pull `**Name**: "line"` dialogue out of prose output.
///
/// Used when structured output is switched off. Names match case-insensitively,
/// at most one line per companion, and matched lines are removed from the narration.
pub fn extract_inline_dialogue(text: &str, roster: &[Companion]) -> (String, Vec<CompanionUtterance>) {
    let mut narration = text.to_string();
    let mut utterances = Vec::new();

    for companion in roster {
        let name = companion.name.trim();
        if name.is_empty() {
            continue;
        }
        let pattern = format!(r#"(?i)\*\*{}\*\*:\s*"([^"]+)"\s*"#, regex_lite::escape(name));
        let Ok(re) = Regex::new(&pattern) else {
            tracing::warn!(companion = %name, "Skipping companion with unusable name pattern");
            continue;
        };

        if let Some(line) = re.captures(&narration).and_then(|caps| caps.get(1)) {
            let dialogue = line.as_str().trim();
            if !dialogue.is_empty() {
                utterances.push(CompanionUtterance::new(companion, dialogue));
            }
        }
        narration = re.replace_all(&narration, "").to_string();
    }

    (narration.trim().to_string(), utterances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mythicbot_domain::Personality;

    fn roster() -> Vec<Companion> {
        vec![
            Companion::new("Lyra", "elf", "rogue", Personality::Mischievous),
            Companion::new("Bram", "dwarf", "cleric", Personality::Grumpy),
        ]
    }

    fn narration_of(raw: &str) -> Option<String> {
        parse_turn_response(raw).map(|p| p.narration)
    }

    #[test]
    fn test_clean_json() {
        let parsed = parse_turn_response(
            r#"{"narration": "Hello world", "companions": [{"name": "Lyra", "dialogue": "Hi!"}]}"#,
        )
        .expect("parses");
        assert_eq!(parsed.narration, "Hello world");
        assert_eq!(parsed.companions.len(), 1);
        assert!(!parsed.salvaged);
    }

    #[test]
    fn test_fenced_code_block() {
        let raw = "Here you go:\n```json\n{\"narration\": \"The door creaks open.\", \"companions\": []}\n```\nEnjoy!";
        assert_eq!(narration_of(raw).as_deref(), Some("The door creaks open."));
    }

    #[test]
    fn test_json_surrounded_by_prose() {
        let raw = "Sure! {\"narration\": \"Rain falls.\", \"companions\": []} Hope that helps.";
        assert_eq!(narration_of(raw).as_deref(), Some("Rain falls."));
    }

    #[test]
    fn test_truncated_json_is_salvaged() {
        let parsed = parse_turn_response(r#"{"narration": "Once upon a ti"#).expect("salvaged");
        assert_eq!(parsed.narration, "Once upon a ti");
        assert!(parsed.companions.is_empty());
        assert!(parsed.salvaged);
    }

    #[test]
    fn test_truncated_json_keeps_escaped_quotes_raw() {
        assert_eq!(
            narration_of(r#"{"narration": "She said \"Hello\""#).as_deref(),
            Some(r#"She said \"Hello\""#)
        );
    }

    #[test]
    fn test_truncated_after_prose() {
        assert_eq!(
            narration_of(r#"Here is potential JSON: {"narration": "Start of story..."#).as_deref(),
            Some("Start of story...")
        );
    }

    #[test]
    fn test_no_narration_returns_none() {
        assert_eq!(parse_turn_response(r#"{"other": "value"}"#), None);
        assert_eq!(parse_turn_response("Just some prose."), None);
        assert_eq!(parse_turn_response(""), None);
    }

    #[test]
    fn test_text_alias_for_dialogue() {
        let parsed =
            parse_turn_response(r#"{"narration": "x", "companions": [{"name": "Bram", "text": "Hmph."}]}"#)
                .expect("parses");
        assert_eq!(parsed.companions[0].dialogue, "Hmph.");
    }

    #[test]
    fn test_null_companions_keep_structured_narration() {
        let parsed = parse_turn_response(
            r#"{"narration": "She said \"hi\".\nThen left.", "companions": null}"#,
        )
        .expect("parses");
        assert_eq!(parsed.narration, "She said \"hi\".\nThen left.");
        assert!(parsed.companions.is_empty());
        assert!(!parsed.salvaged);
    }

    #[test]
    fn test_malformed_companion_entries_are_dropped_individually() {
        let parsed = parse_turn_response(
            r#"{"narration": "Rain.", "companions": [
                {"name": "Lyra", "dialogue": null},
                {"name": "Bram", "dialogue": "Wet again."},
                {"name": "Lyra", "dialogue": 42},
                "not an object"
            ]}"#,
        )
        .expect("parses");
        assert_eq!(parsed.narration, "Rain.");
        assert!(!parsed.salvaged);
        assert_eq!(
            parsed.companions,
            vec![RawCompanionLine {
                name: "Bram".into(),
                dialogue: "Wet again.".into()
            }]
        );
    }

    #[test]
    fn test_special_tokens_are_stripped() {
        let raw = "<|channel|>analysis<|message|>thinking<|end|><|start|>assistant<|channel|>final<|message|>{\"narration\": \"Done.\"}";
        assert_eq!(narration_of(raw).as_deref(), Some("Done."));
    }

    #[test]
    fn test_sanitize_drops_unknown_and_empty() {
        let lines = vec![
            RawCompanionLine { name: "Lyra".into(), dialogue: "Shiny!".into() },
            RawCompanionLine { name: "Gandalf".into(), dialogue: "You shall not pass".into() },
            RawCompanionLine { name: "lyra".into(), dialogue: "wrong case".into() },
            RawCompanionLine { name: "Bram".into(), dialogue: "   ".into() },
        ];
        let utterances = sanitize_companions(&lines, &roster());
        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].companion_name, "Lyra");
        assert_eq!(utterances[0].companion_race, "elf");
        assert_eq!(utterances[0].personality, Personality::Mischievous);
    }

    #[test]
    fn test_inline_dialogue_extraction() {
        let text = "The torch gutters.\n\n**Lyra**: \"I call dibs on the gold.\"\n**bram**: \"Figures.\"\n\nWhat now?";
        let (narration, utterances) = extract_inline_dialogue(text, &roster());
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].text, "I call dibs on the gold.");
        assert_eq!(utterances[1].companion_name, "Bram");
        assert!(!narration.contains("**Lyra**"));
        assert!(!narration.contains("Figures."));
        assert!(narration.starts_with("The torch gutters."));
        assert!(narration.ends_with("What now?"));
    }
}
