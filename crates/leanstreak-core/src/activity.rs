//! Sparse per-day activity logs.
//!
//! A [`DailyLog`] maps calendar days to what was recorded on them. Days that
//! are absent are gaps, never errors. Two encodings share the same map:
//! continuous amounts (minutes of mindfulness or workout) and discrete level
//! keys (e.g. the `steady`/`easy`/`wild` consumption levels).

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{DayAssignment, DayCalendar};
use crate::error::ValidationError;

/// Value recorded for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayValue {
    /// Continuous amount, e.g. minutes
    Amount(f64),
    /// Discrete level key, e.g. `"steady"`
    Level(String),
}

impl DayValue {
    pub fn amount(&self) -> Option<f64> {
        match self {
            DayValue::Amount(amount) => Some(*amount),
            DayValue::Level(_) => None,
        }
    }

    pub fn level(&self) -> Option<&str> {
        match self {
            DayValue::Level(level) => Some(level),
            DayValue::Amount(_) => None,
        }
    }
}

impl From<f64> for DayValue {
    fn from(amount: f64) -> Self {
        DayValue::Amount(amount)
    }
}

impl From<ConsumptionLevel> for DayValue {
    fn from(level: ConsumptionLevel) -> Self {
        DayValue::Level(level.key().to_string())
    }
}

/// Mapping from calendar day to recorded value, keyed in a single calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLog {
    days: BTreeMap<NaiveDate, DayValue>,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `day`, replacing any previous value.
    pub fn insert(&mut self, day: NaiveDate, value: impl Into<DayValue>) -> Option<DayValue> {
        self.days.insert(day, value.into())
    }

    pub fn get(&self, day: NaiveDate) -> Option<&DayValue> {
        self.days.get(&day)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains_key(&day)
    }

    /// Earliest recorded day.
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    /// Latest recorded day.
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayValue)> {
        self.days.iter().map(|(day, value)| (*day, value))
    }

    /// Keep only days in `[today - days, today]`.
    ///
    /// Mirrors the rolling fetch window callers use to bound work. Note that
    /// trimming history moves the start boundary, so streaks longer than the
    /// window are truncated. A window reaching past the earliest
    /// representable date keeps every day up to `today`.
    pub fn within_window(&self, today: NaiveDate, days: u32) -> DailyLog {
        let kept: BTreeMap<NaiveDate, DayValue> =
            match today.checked_sub_days(Days::new(u64::from(days))) {
                Some(start) => self.days.range(start..=today),
                None => self.days.range(..=today),
            }
            .map(|(day, value)| (*day, value.clone()))
            .collect();
        DailyLog { days: kept }
    }

    /// Normalize raw timestamped entries into day keys.
    ///
    /// Amounts logged on the same day are summed. For levels the entry with
    /// the latest timestamp wins.
    pub fn from_entries(
        entries: &[ActivityEntry],
        calendar: &DayCalendar,
        assignment: DayAssignment,
    ) -> Result<Self, ValidationError> {
        assignment.validate()?;
        let mut days: BTreeMap<NaiveDate, DayValue> = BTreeMap::new();
        let mut level_stamps: BTreeMap<NaiveDate, DateTime<Utc>> = BTreeMap::new();

        for entry in entries {
            let day = calendar.assign_day(entry.timestamp, assignment);
            match (entry.amount, &entry.level) {
                (Some(amount), None) => {
                    if !amount.is_finite() || amount < 0.0 {
                        return Err(ValidationError::InvalidAmount { day, amount });
                    }
                    let total = match days.get(&day) {
                        Some(DayValue::Amount(existing)) => existing + amount,
                        _ => amount,
                    };
                    days.insert(day, DayValue::Amount(total));
                }
                (None, Some(level)) => {
                    let newer = level_stamps
                        .get(&day)
                        .map_or(true, |seen| entry.timestamp >= *seen);
                    if newer {
                        level_stamps.insert(day, entry.timestamp);
                        days.insert(day, DayValue::Level(level.clone()));
                    }
                }
                _ => {
                    return Err(ValidationError::AmbiguousEntry {
                        timestamp: entry.timestamp,
                    })
                }
            }
        }

        Ok(Self { days })
    }
}

impl FromIterator<(NaiveDate, DayValue)> for DailyLog {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DayValue)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// A single timestamped log entry as produced by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ActivityEntry {
    pub fn amount(timestamp: DateTime<Utc>, amount: f64) -> Self {
        Self {
            timestamp,
            amount: Some(amount),
            level: None,
        }
    }

    pub fn level(timestamp: DateTime<Utc>, level: impl Into<String>) -> Self {
        Self {
            timestamp,
            amount: None,
            level: Some(level.into()),
        }
    }
}

/// Alcohol consumption level for the NoAlc tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionLevel {
    /// 0-1 drinks
    Steady,
    /// 2-5 drinks
    Easy,
    /// 6+ drinks
    Wild,
}

impl ConsumptionLevel {
    pub const ALL: [ConsumptionLevel; 3] = [
        ConsumptionLevel::Steady,
        ConsumptionLevel::Easy,
        ConsumptionLevel::Wild,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ConsumptionLevel::Steady => "steady",
            ConsumptionLevel::Easy => "easy",
            ConsumptionLevel::Wild => "wild",
        }
    }

    /// Encoded value written to health stores.
    pub fn health_value(&self) -> u32 {
        match self {
            ConsumptionLevel::Steady => 0,
            ConsumptionLevel::Easy => 4,
            ConsumptionLevel::Wild => 6,
        }
    }

    pub fn from_health_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.health_value() == value)
    }

    pub fn from_drink_count(count: u32) -> Self {
        match count {
            0..=1 => ConsumptionLevel::Steady,
            2..=5 => ConsumptionLevel::Easy,
            _ => ConsumptionLevel::Wild,
        }
    }

    /// Decode a stored sample: encoded levels first, raw drink counts otherwise.
    pub fn from_sample(value: u32) -> Self {
        Self::from_health_value(value).unwrap_or_else(|| Self::from_drink_count(value))
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.key() == key)
    }
}
