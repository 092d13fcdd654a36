//! Good-day rules.
//!
//! Every tracker type reduces to one boolean question per calendar day. The
//! rule decides it from whatever the log holds for that day; an absent day is
//! always a gap.

use serde::{Deserialize, Serialize};

use crate::activity::{ConsumptionLevel, DayValue};
use crate::error::ValidationError;

/// Rule turning a day's recorded value into good / not good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoodDayRule {
    /// `round(amount) >= threshold`
    MinimumAmount { threshold: f64 },
    /// Level key equals the designated best level
    BestLevel { level: String },
}

impl GoodDayRule {
    /// Default minimum for minute-based trackers.
    pub const DEFAULT_MINIMUM_MINUTES: f64 = 2.0;

    pub fn minimum_amount(threshold: f64) -> Self {
        GoodDayRule::MinimumAmount { threshold }
    }

    pub fn best_level(level: impl Into<String>) -> Self {
        GoodDayRule::BestLevel {
            level: level.into(),
        }
    }

    /// The NoAlc rule: only `steady` days are good.
    pub fn steady_consumption() -> Self {
        Self::best_level(ConsumptionLevel::Steady.key())
    }

    /// Evaluate the rule for one day's value.
    ///
    /// Amounts are rounded half away from zero before comparing, so 1.8
    /// passes a threshold of 2 and 1.4 does not.
    pub fn is_good(&self, value: Option<&DayValue>) -> bool {
        match (self, value) {
            (GoodDayRule::MinimumAmount { threshold }, Some(DayValue::Amount(amount))) => {
                amount.round() >= *threshold
            }
            (GoodDayRule::BestLevel { level }, Some(DayValue::Level(recorded))) => {
                recorded == level
            }
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            GoodDayRule::MinimumAmount { threshold } => {
                if !threshold.is_finite() || *threshold < 0.0 {
                    return Err(ValidationError::invalid(
                        "threshold",
                        format!("{threshold} must be finite and non-negative"),
                    ));
                }
            }
            GoodDayRule::BestLevel { level } => {
                if level.trim().is_empty() {
                    return Err(ValidationError::invalid("level", "level key is empty"));
                }
            }
        }
        Ok(())
    }
}

impl Default for GoodDayRule {
    fn default() -> Self {
        Self::minimum_amount(Self::DEFAULT_MINIMUM_MINUTES)
    }
}
