//! Companion entity - an AI-voiced party member with a fixed personality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Maximum companions travelling with the player.
pub const MAX_COMPANIONS: usize = 3;

/// Personality tag that drives a companion's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Personality {
    #[default]
    Cheerful,
    Stoic,
    Sarcastic,
    Wise,
    Impulsive,
    Cautious,
    Grumpy,
    Mischievous,
}

impl Personality {
    pub const ALL: [Personality; 8] = [
        Self::Cheerful,
        Self::Stoic,
        Self::Sarcastic,
        Self::Wise,
        Self::Impulsive,
        Self::Cautious,
        Self::Grumpy,
        Self::Mischievous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cheerful => "Cheerful",
            Self::Stoic => "Stoic",
            Self::Sarcastic => "Sarcastic",
            Self::Wise => "Wise",
            Self::Impulsive => "Impulsive",
            Self::Cautious => "Cautious",
            Self::Grumpy => "Grumpy",
            Self::Mischievous => "Mischievous",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Personality {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::parse(format!("Unknown personality: {s}")))
    }
}

/// A party member. Immutable once the adventure starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub personality: Personality,
}

impl Companion {
    pub fn new(
        name: impl Into<String>,
        race: impl Into<String>,
        class: impl Into<String>,
        personality: Personality,
    ) -> Self {
        Self {
            name: name.into(),
            race: race.into(),
            class: class.into(),
            personality,
        }
    }
}

/// Check a roster: at most [`MAX_COMPANIONS`], non-empty unique names.
pub fn validate_roster(companions: &[Companion]) -> Result<(), DomainError> {
    if companions.len() > MAX_COMPANIONS {
        return Err(DomainError::party_full(companions.len(), MAX_COMPANIONS));
    }
    for (i, companion) in companions.iter().enumerate() {
        if companion.name.trim().is_empty() {
            return Err(DomainError::validation("Companion name cannot be empty"));
        }
        if companions[..i].iter().any(|c| c.name == companion.name) {
            return Err(DomainError::validation(format!(
                "Duplicate companion name: {}",
                companion.name
            )));
        }
    }
    Ok(())
}
