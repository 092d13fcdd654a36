//! # LeanStreak Core Library
//!
//! Streak and joker calculation for daily habit trackers. A sparse per-day
//! activity log (minutes of meditation, workout minutes, consumption levels)
//! becomes a current streak length plus a small ledger of reward tokens that
//! can retroactively heal gaps.
//!
//! ## Architecture
//!
//! - **Engine**: a stateless, deterministic walk over calendar days; no I/O
//! - **Rules**: one good-day rule per tracker (minimum amount or best level)
//! - **Calendar**: fixed-offset day boundaries and log-day assignment
//! - **Storage**: TOML configuration and SQLite snapshot persistence
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: streak and joker calculation
//! - [`DailyLog`]: day-keyed activity map
//! - [`GoodDayRule`]: good-day predicate
//! - [`StreakService`]: per-tracker recompute flow producing [`StreakRecord`]s
//! - [`Config`] / [`SnapshotStore`]: configuration and persistence

pub mod activity;
pub mod calendar;
pub mod engine;
pub mod error;
pub mod result;
pub mod rules;
pub mod storage;
pub mod tracker;

pub use activity::{ActivityEntry, ConsumptionLevel, DailyLog, DayValue};
pub use calendar::{DayAssignment, DayCalendar};
pub use engine::{
    DayOutcome, DayRecord, RewardPolicy, StreakEngine, StreakReport, TodayPolicy,
    MILESTONE_INTERVAL_DAYS, REWARD_CAP,
};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use result::{StreakRecord, StreakResult};
pub use rules::GoodDayRule;
pub use storage::{Config, EngineConfig, SnapshotStore};
pub use tracker::{StreakService, TrackerDefinition, MAX_WINDOW_DAYS};
