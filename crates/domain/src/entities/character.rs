//! Player character entity
//!
//! The orchestrator only reads characters. HP and stat changes happen through
//! explicit player actions on the character sheet.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ability_modifier, Ability};

/// The six raw ability scores. Missing scores default to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.score(ability))
    }
}

/// The player's character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub class: String,
    pub stats: AbilityScores,
    pub skills: Vec<String>,
    pub hp: i32,
    pub max_hp: i32,
    pub level: u32,
    pub personality: String,
    pub traits: String,
    pub background: String,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            name: "Adventurer".to_string(),
            race: "human".to_string(),
            class: "fighter".to_string(),
            stats: AbilityScores::default(),
            skills: Vec::new(),
            hp: 10,
            max_hp: 10,
            level: 1,
            personality: String::new(),
            traits: String::new(),
            background: String::new(),
        }
    }
}

impl Character {
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.stats.modifier(ability)
    }

    /// Apply damage (negative) or healing (positive), keeping hp in `[0, max_hp]`.
    pub fn adjust_hp(&mut self, delta: i32) {
        self.hp = self.hp.saturating_add(delta).clamp(0, self.max_hp.max(0));
    }

    pub fn is_conscious(&self) -> bool {
        self.hp > 0
    }

    pub fn is_proficient(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}
