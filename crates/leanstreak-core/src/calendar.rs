//! Calendar-day boundaries and day arithmetic.
//!
//! Every activity log key and every "today" the engine computes must come
//! from the same [`DayCalendar`]. Mixing calendars (e.g. keys normalized in
//! UTC, engine evaluated at +09:00) shifts days silently; nothing here can
//! detect that.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Calendar defined by a fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCalendar {
    offset: FixedOffset,
}

impl DayCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar whose days begin at UTC midnight.
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Parse an offset such as `+02:00`, `-05:30` or `Z`.
    pub fn from_offset_str(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        FixedOffset::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| ValidationError::invalid("offset", format!("'{s}': {e}")))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Calendar day of the evaluation instant.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_of(now)
    }

    /// Midnight at the start of `day` in this calendar.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<FixedOffset> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc_midnight, self.offset)
    }

    /// Following day; saturates at the last representable date.
    pub fn next_day(&self, day: NaiveDate) -> NaiveDate {
        day.succ_opt().unwrap_or(day)
    }

    /// Preceding day; saturates at the first representable date.
    pub fn previous_day(&self, day: NaiveDate) -> NaiveDate {
        day.pred_opt().unwrap_or(day)
    }

    /// Signed number of days from `from` to `to`.
    pub fn days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }

    /// Day an instant is credited to under the given assignment rule.
    pub fn assign_day(&self, instant: DateTime<Utc>, assignment: DayAssignment) -> NaiveDate {
        let local = instant.with_timezone(&self.offset);
        match assignment {
            DayAssignment::Midnight => local.date_naive(),
            // Hours past 23 never come from `cutoff()`; treat them as midnight
            DayAssignment::CutoffHour(hour) => {
                if hour <= 23 && local.hour() < u32::from(hour) {
                    self.previous_day(local.date_naive())
                } else {
                    local.date_naive()
                }
            }
        }
    }
}

impl Default for DayCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Serialize for DayCalendar {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.offset.to_string())
    }
}

impl<'de> Deserialize<'de> for DayCalendar {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DayCalendar::from_offset_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Rule mapping a logged instant to the day it counts for.
///
/// `CutoffHour(18)` credits anything logged before 18:00 to the previous day,
/// which is how evening habits ("did I drink last night?") are recorded the
/// next morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayAssignment {
    #[default]
    Midnight,
    CutoffHour(u8),
}

impl DayAssignment {
    pub fn cutoff(hour: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::invalid(
                "day_assignment",
                format!("cutoff hour {hour} is outside 0..=23"),
            ));
        }
        Ok(if hour == 0 {
            DayAssignment::Midnight
        } else {
            DayAssignment::CutoffHour(hour)
        })
    }
}

impl DayAssignment {
    /// Reject cutoff hours built directly outside `0..=23`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            DayAssignment::CutoffHour(hour) => DayAssignment::cutoff(hour).map(|_| ()),
            DayAssignment::Midnight => Ok(()),
        }
    }
}

impl fmt::Display for DayAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayAssignment::Midnight => write!(f, "midnight"),
            DayAssignment::CutoffHour(hour) => write!(f, "cutoff:{hour}"),
        }
    }
}

impl FromStr for DayAssignment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("midnight") {
            return Ok(DayAssignment::Midnight);
        }
        let hour = s
            .strip_prefix("cutoff:")
            .ok_or_else(|| {
                ValidationError::invalid(
                    "day_assignment",
                    format!("expected 'midnight' or 'cutoff:<hour>', got '{s}'"),
                )
            })?
            .parse::<u8>()
            .map_err(|e| ValidationError::invalid("day_assignment", e.to_string()))?;
        DayAssignment::cutoff(hour)
    }
}

impl Serialize for DayAssignment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayAssignment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
