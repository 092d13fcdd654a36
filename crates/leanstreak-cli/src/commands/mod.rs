pub mod calc;
pub mod config;
pub mod tracker;

use std::path::Path;

use chrono::{DateTime, Utc};
use leanstreak_core::{ActivityEntry, DailyLog};

/// Contents of a `--log` file.
pub enum LogFile {
    /// `{"2026-01-05": 12.5, "2026-01-06": "steady"}`
    Days(DailyLog),
    /// `[{"timestamp": "...", "amount": 3.0}, ...]`
    Entries(Vec<ActivityEntry>),
}

pub fn read_log(path: &Path) -> Result<LogFile, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if value.is_array() {
        Ok(LogFile::Entries(serde_json::from_value(value)?))
    } else {
        Ok(LogFile::Days(serde_json::from_value(value)?))
    }
}

/// `--now` as RFC 3339, or the wall clock.
pub fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, chrono::ParseError> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
