//! Streak result and its persisted snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::REWARD_CAP;

/// Outcome of one streak calculation.
///
/// `rewards_consumed <= rewards_earned` always holds for values produced by
/// the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakResult {
    pub streak: u32,
    pub rewards_earned: u32,
    pub rewards_consumed: u32,
}

impl StreakResult {
    pub const ZERO: StreakResult = StreakResult {
        streak: 0,
        rewards_earned: 0,
        rewards_consumed: 0,
    };

    /// Jokers on hand, capped at [`REWARD_CAP`].
    pub fn available_rewards(&self) -> u32 {
        self.available_rewards_capped(REWARD_CAP)
    }

    pub fn available_rewards_capped(&self, cap: u32) -> u32 {
        self.rewards_earned
            .saturating_sub(self.rewards_consumed)
            .min(cap)
    }
}

/// Persisted streak snapshot.
///
/// Every field defaults when missing so records written by older versions
/// (e.g. before `rewards_consumed` existed) still decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakRecord {
    #[serde(default)]
    pub current_streak_days: u32,
    #[serde(default)]
    pub rewards_earned: u32,
    #[serde(default)]
    pub rewards_consumed: u32,
    #[serde(default)]
    pub available_rewards: u32,
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StreakRecord {
    pub fn from_result(result: &StreakResult, last_activity_date: Option<NaiveDate>) -> Self {
        Self {
            current_streak_days: result.streak,
            rewards_earned: result.rewards_earned,
            rewards_consumed: result.rewards_consumed,
            available_rewards: result.available_rewards(),
            last_activity_date,
            updated_at: None,
        }
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn result(&self) -> StreakResult {
        StreakResult {
            streak: self.current_streak_days,
            rewards_earned: self.rewards_earned,
            rewards_consumed: self.rewards_consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_rewards_is_capped() {
        let result = StreakResult {
            streak: 40,
            rewards_earned: 5,
            rewards_consumed: 1,
        };
        assert_eq!(result.available_rewards(), 3);
        assert_eq!(result.available_rewards_capped(5), 4);
        assert_eq!(StreakResult::ZERO.available_rewards(), 0);
    }

    #[test]
    fn old_records_decode_with_defaults() {
        // Written before rewards_consumed and available_rewards existed
        let json = r#"{"current_streak_days":5,"rewards_earned":2,"last_activity_date":"2026-01-04"}"#;
        let record: StreakRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.current_streak_days, 5);
        assert_eq!(record.rewards_earned, 2);
        assert_eq!(record.rewards_consumed, 0);
        assert_eq!(record.available_rewards, 0);
        assert_eq!(record.last_activity_date, NaiveDate::from_ymd_opt(2026, 1, 4));
        assert!(record.updated_at.is_none());

        let empty: StreakRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, StreakRecord::default());
    }

    #[test]
    fn record_round_trips_through_result() {
        let result = StreakResult {
            streak: 9,
            rewards_earned: 1,
            rewards_consumed: 1,
        };
        let record = StreakRecord::from_result(&result, None);
        assert_eq!(record.available_rewards, 0);
        assert_eq!(record.result(), result);
    }
}
