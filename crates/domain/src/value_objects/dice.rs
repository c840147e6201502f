//! Dice value objects - roll outcomes and single die results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Faces on the die every check is rolled with.
pub const D20: u32 = 20;

/// Result of a d20 check, supplied by the player when resolving a pending roll.
///
/// A natural 20 always succeeds and a natural 1 always fails, whatever the
/// modifier and DC; otherwise the check succeeds when `total >= dc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
    pub raw: u32,
    pub modifier: i32,
    pub total: i32,
    pub is_success: bool,
}

impl RollOutcome {
    /// Evaluate a raw die value against a DC.
    ///
    /// Out-of-range die values are clamped to `1..=20`; the total saturates.
    pub fn evaluate(raw: u32, modifier: i32, dc: u32) -> Self {
        let raw = raw.clamp(1, D20);
        let total = modifier.saturating_add(raw as i32);
        let is_success = match raw {
            D20 => true,
            1 => false,
            _ => total >= dc_as_total(dc),
        };

        Self {
            raw,
            modifier,
            total,
            is_success,
        }
    }

    /// Re-evaluate a caller-supplied outcome against the DC the action was judged at.
    ///
    /// The raw value and modifier are kept; total and success are recomputed.
    pub fn reconcile(&self, dc: u32) -> Self {
        Self::evaluate(self.raw, self.modifier, dc)
    }

    pub fn is_critical_success(&self) -> bool {
        self.raw == D20
    }

    pub fn is_critical_failure(&self) -> bool {
        self.raw == 1
    }

    pub fn tier(&self) -> OutcomeTier {
        if self.is_critical_success() {
            OutcomeTier::CriticalSuccess
        } else if self.is_critical_failure() {
            OutcomeTier::CriticalFailure
        } else if self.is_success {
            OutcomeTier::Success
        } else {
            OutcomeTier::Failure
        }
    }

    /// Format as `15 + 2 = 17` or `9 - 1 = 8`.
    pub fn breakdown(&self) -> String {
        let sign = if self.modifier >= 0 { '+' } else { '-' };
        format!(
            "{} {} {} = {}",
            self.raw,
            sign,
            self.modifier.unsigned_abs(),
            self.total
        )
    }
}

/// A DC on the same scale as a roll total. DCs beyond `i32::MAX` saturate.
pub fn dc_as_total(dc: u32) -> i32 {
    i32::try_from(dc).unwrap_or(i32::MAX)
}

/// How a resolved check turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeTier {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl OutcomeTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CriticalSuccess => "CRITICAL SUCCESS!",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::CriticalFailure => "CRITICAL FAILURE!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::CriticalSuccess | Self::Success)
    }
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CriticalSuccess => "critical_success",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::CriticalFailure => "critical_failure",
        };
        write!(f, "{}", name)
    }
}

/// A single die thrown by the player from the dice tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DieRoll {
    pub value: u32,
    pub sides: u32,
    pub is_critical: bool,
    pub is_fumble: bool,
    pub timestamp: DateTime<Utc>,
}

impl DieRoll {
    pub fn new(value: u32, sides: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            sides,
            is_critical: value == sides,
            is_fumble: value == 1,
            timestamp,
        }
    }

    /// Chat line announcing the roll, e.g. `🎲 I roll a d20... [20] Critical!`.
    pub fn message(&self) -> String {
        let suffix = if self.is_critical {
            " Critical!"
        } else if self.is_fumble {
            " Fumble!"
        } else {
            ""
        };
        format!("🎲 I roll a d{}... [{}]{}", self.sides, self.value, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_twenty_always_succeeds() {
        let outcome = RollOutcome::evaluate(20, -5, 30);
        assert!(outcome.is_success);
        assert_eq!(outcome.tier(), OutcomeTier::CriticalSuccess);
    }

    #[test]
    fn test_natural_one_always_fails() {
        let outcome = RollOutcome::evaluate(1, 15, 5);
        assert_eq!(outcome.total, 16);
        assert!(!outcome.is_success);
        assert_eq!(outcome.tier(), OutcomeTier::CriticalFailure);
    }

    #[test]
    fn test_meeting_dc_succeeds() {
        let outcome = RollOutcome::evaluate(11, 2, 13);
        assert_eq!(outcome.total, 13);
        assert!(outcome.is_success);

        let miss = RollOutcome::evaluate(10, 2, 13);
        assert!(!miss.is_success);
        assert_eq!(miss.tier(), OutcomeTier::Failure);
    }

    #[test]
    fn test_crit_law_holds_for_every_modifier_and_dc() {
        for modifier in -5..=10 {
            for dc in 1..=30 {
                assert!(RollOutcome::evaluate(20, modifier, dc).is_success);
                assert!(!RollOutcome::evaluate(1, modifier, dc).is_success);
            }
        }
    }

    #[test]
    fn test_reconcile_recomputes_total_and_success() {
        let claimed = RollOutcome {
            raw: 15,
            modifier: 2,
            total: 99,
            is_success: false,
        };
        let fixed = claimed.reconcile(13);
        assert_eq!(fixed.total, 17);
        assert!(fixed.is_success);
    }

    #[test]
    fn test_extreme_modifiers_and_dcs_saturate() {
        let huge = RollOutcome::evaluate(15, i32::MAX, 13);
        assert_eq!(huge.total, i32::MAX);
        assert!(huge.is_success);

        let tiny = RollOutcome::evaluate(15, i32::MIN, 13);
        assert_eq!(tiny.total, i32::MIN + 15);
        assert!(!tiny.is_success);
        assert_eq!(tiny.breakdown(), format!("15 - {} = {}", i32::MIN.unsigned_abs(), i32::MIN + 15));

        let unreachable_dc = RollOutcome::evaluate(19, 1000, u32::MAX);
        assert!(!unreachable_dc.is_success);
        assert_eq!(dc_as_total(u32::MAX), i32::MAX);
    }

    #[test]
    fn test_out_of_range_raw_is_clamped() {
        assert_eq!(RollOutcome::evaluate(0, 0, 10).raw, 1);
        assert_eq!(RollOutcome::evaluate(25, 0, 10).raw, 20);
    }

    #[test]
    fn test_breakdown_formats_negative_modifier() {
        assert_eq!(RollOutcome::evaluate(9, -1, 12).breakdown(), "9 - 1 = 8");
        assert_eq!(RollOutcome::evaluate(15, 2, 12).breakdown(), "15 + 2 = 17");
    }

    #[test]
    fn test_die_roll_message() {
        let now = Utc::now();
        assert_eq!(
            DieRoll::new(20, 20, now).message(),
            "🎲 I roll a d20... [20] Critical!"
        );
        assert_eq!(DieRoll::new(1, 6, now).message(), "🎲 I roll a d6... [1] Fumble!");
        assert_eq!(DieRoll::new(4, 8, now).message(), "🎲 I roll a d8... [4]");
    }
}
