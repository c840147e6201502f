//! Action classifier.
//!
//! Maps free-form player text to an [`ActionJudgment`]. Classification is a
//! pure function of the text and the companion names: resolving a pending
//! roll re-runs it on the stored action text and must land on the same
//! ability and DC.
//!
//! Steps, in order:
//! 1. a leading companion name (plus `,` or `:`) makes that companion the actor
//! 2. trivial phrases (exact or prefix match) need no roll
//! 3. keyword rules, first match wins
//! 4. anything else is an exploration action with no roll
//!
//! The rules live in a [`RuleTable`] that can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use mythicbot_domain::{Ability, ActionJudgment, ActionType, Actor, Companion, RollType};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to read rule table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rule table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}

/// One keyword rule: any keyword found as a whole word, or with a regular
/// `-s`/`-ed`/`-ing` ending, fires the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub roll_type: RollType,
    pub ability: Ability,
    pub dc: u32,
    /// `None` picks exploration for sneaking/hiding text and interaction otherwise.
    #[serde(default)]
    pub action_type: Option<ActionType>,
}

/// Editable classification data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Phrases that never need a roll.
    pub trivial: Vec<String>,
    /// Evaluated top to bottom.
    pub rules: Vec<KeywordRule>,
    /// Words that make a heuristic check count as exploration.
    #[serde(default)]
    pub exploration_markers: Vec<String>,
}

impl RuleTable {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)?;
        let table: RuleTable = serde_json::from_str(&raw)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        for rule in &self.rules {
            let invalid = |reason: &str| ClassifierError::InvalidRule {
                rule: rule.name.clone(),
                reason: reason.to_string(),
            };
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(invalid("no keywords"));
            }
            if rule.roll_type == RollType::NoRoll {
                return Err(invalid("keyword rules must require a roll"));
            }
            if rule.dc == 0 {
                return Err(invalid("dc must be positive"));
            }
        }
        Ok(())
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        use ActionType::{Combat, Exploration, Interaction};
        use RollType::{AbilityCheck, AttackRoll};

        let rule = |name: &str,
                    keywords: &[&str],
                    roll_type: RollType,
                    ability: Ability,
                    dc: u32,
                    action_type: Option<ActionType>| KeywordRule {
            name: name.to_string(),
            keywords: words(keywords),
            roll_type,
            ability,
            dc,
            action_type,
        };

        Self {
            trivial: words(&[
                "look around",
                "observe",
                "check inventory",
                "rest",
                "sit",
                "stand",
                "walk",
                "talk to companion",
                "eat",
                "drink",
                "wait",
                "think",
                "examine",
                "read",
                "open door",
                "close door",
                "pick up",
                "put down",
                "equip",
                "unequip",
            ]),
            rules: vec![
                // Deterministic rules: combat, exploration, social
                rule(
                    "combat",
                    &[
                        "attack", "strike", "slash", "shoot", "punch", "smash", "stab", "hit",
                        "kick", "swing at", "cast at",
                    ],
                    AttackRoll,
                    Ability::Strength,
                    13,
                    Some(Combat),
                ),
                rule(
                    "search",
                    &["search", "investigate", "inspect", "track", "look for", "scan"],
                    AbilityCheck,
                    Ability::Wisdom,
                    12,
                    Some(Exploration),
                ),
                rule(
                    "stealth",
                    &["sneak", "hide", "lockpick", "pick the lock", "pick lock", "creep"],
                    AbilityCheck,
                    Ability::Dexterity,
                    13,
                    Some(Exploration),
                ),
                rule(
                    "athletics",
                    &["climb", "force", "break", "pry"],
                    AbilityCheck,
                    Ability::Strength,
                    12,
                    Some(Exploration),
                ),
                rule(
                    "social",
                    &[
                        "persuade", "intimidate", "deceive", "convince", "bluff", "lie to",
                        "lying to",
                    ],
                    AbilityCheck,
                    Ability::Charisma,
                    12,
                    Some(Interaction),
                ),
                // Broader fallbacks
                rule(
                    "attack-broad",
                    &[
                        "fight", "charge at", "tackle", "shove", "grapple", "fire at",
                        "throw at", "lunge", "ambush", "slay", "kill", "assault",
                    ],
                    AttackRoll,
                    Ability::Strength,
                    14,
                    Some(Combat),
                ),
                rule(
                    "strength",
                    &["push", "pull", "lift", "jump", "swim against", "swim"],
                    AbilityCheck,
                    Ability::Strength,
                    12,
                    None,
                ),
                rule(
                    "dexterity",
                    &["pickpocket", "acrobatics", "dodge", "tumble", "balance"],
                    AbilityCheck,
                    Ability::Dexterity,
                    12,
                    None,
                ),
                rule(
                    "constitution",
                    &["endure", "resist poison", "hold breath", "hold my breath", "march", "survive"],
                    AbilityCheck,
                    Ability::Constitution,
                    12,
                    None,
                ),
                rule(
                    "intelligence",
                    &["recall", "decipher", "identify", "arcana", "study"],
                    AbilityCheck,
                    Ability::Intelligence,
                    12,
                    None,
                ),
                rule(
                    "wisdom",
                    &["insight", "medicine", "sense motive", "perceive", "search carefully", "listen"],
                    AbilityCheck,
                    Ability::Wisdom,
                    12,
                    None,
                ),
                rule(
                    "charisma",
                    &["perform", "charm", "negotiate", "haggle"],
                    AbilityCheck,
                    Ability::Charisma,
                    12,
                    None,
                ),
            ],
            exploration_markers: words(&["sneak", "hide"]),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Pure classifier over a validated [`RuleTable`].
#[derive(Debug, Clone)]
pub struct ActionClassifier {
    table: RuleTable,
}

impl Default for ActionClassifier {
    fn default() -> Self {
        Self {
            table: RuleTable::builtin(),
        }
    }
}

impl ActionClassifier {
    pub fn new(table: RuleTable) -> Result<Self, ClassifierError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn classify(&self, action: &str, companions: &[Companion]) -> ActionJudgment {
        let (actor, remainder) = extract_actor(action, companions);
        let text = remainder.trim().to_lowercase();

        if self.is_trivial(&text) {
            return ActionJudgment::no_roll(ActionType::Trivial).performed_by(actor);
        }

        let matched = self
            .table
            .rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| contains_word(&text, k)));

        match matched {
            Some(rule) => {
                let action_type = rule.action_type.unwrap_or_else(|| {
                    if self
                        .table
                        .exploration_markers
                        .iter()
                        .any(|m| contains_word(&text, m))
                    {
                        ActionType::Exploration
                    } else {
                        ActionType::Interaction
                    }
                });
                ActionJudgment::with_check(rule.roll_type, action_type, rule.ability, rule.dc)
                    .performed_by(actor)
            }
            None => ActionJudgment::no_roll(ActionType::Exploration).performed_by(actor),
        }
    }

    fn is_trivial(&self, text: &str) -> bool {
        self.table.trivial.iter().any(|phrase| {
            let phrase = phrase.trim().to_lowercase();
            !phrase.is_empty()
                && text
                    .strip_prefix(phrase.as_str())
                    .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
        })
    }
}

/// Split off a leading companion name, returning the actor and the rest of the text.
fn extract_actor<'a>(action: &'a str, companions: &[Companion]) -> (Actor, &'a str) {
    let trimmed = action.trim_start();
    for companion in companions {
        if let Some(rest) = strip_leading_name(trimmed, &companion.name) {
            return (Actor::Companion(companion.name.clone()), rest);
        }
    }
    (Actor::Player, action)
}

fn strip_leading_name<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut chars = text.char_indices();
    let mut end = 0;
    for expected in name.chars() {
        let (idx, found) = chars.next()?;
        if !found.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = idx + found.len_utf8();
    }

    let rest = &text[end..];
    if rest.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return None;
    }

    let rest = rest.trim_start();
    let rest = rest.strip_prefix([',', ':']).unwrap_or(rest);
    Some(rest.trim_start())
}

/// Endings a keyword may carry and still match.
const INFLECTIONS: [&str; 6] = ["", "s", "es", "d", "ed", "ing"];

/// True when `keyword` occurs in `text` as a word, allowing regular inflections.
///
/// Both sides are expected lowercase. "attack" matches "attacks" and "attacking",
/// "stab" matches "stabbed", "hide" matches "hiding", but "stab" never matches
/// "stable".
fn contains_word(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return false;
    }
    if matches_stem(text, keyword, &INFLECTIONS) {
        return true;
    }
    // hide -> hiding
    keyword
        .strip_suffix('e')
        .is_some_and(|stem| !stem.is_empty() && matches_stem(text, stem, &["ing"]))
}

fn matches_stem(text: &str, stem: &str, endings: &[&str]) -> bool {
    text.match_indices(stem).any(|(idx, _)| {
        let starts_word = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        if !starts_word {
            return false;
        }

        let rest = &text[idx + stem.len()..];
        let tail_len = rest
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(rest.len());
        let tail = &rest[..tail_len];
        if endings.contains(&tail) {
            return true;
        }

        // stab -> stabbing, hit -> hitting
        stem.chars().next_back().is_some_and(|last| {
            tail.strip_prefix(last)
                .is_some_and(|t| ["ed", "ing"].contains(&t) && endings.contains(&t))
        })
    })
}
