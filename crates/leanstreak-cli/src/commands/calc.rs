use std::path::PathBuf;

use clap::{Args, ValueEnum};
use leanstreak_core::{
    DailyLog, DayAssignment, DayCalendar, DayRecord, GoodDayRule, StreakEngine, StreakResult,
    TodayPolicy,
};
use serde::Serialize;

use super::{parse_now, read_log, LogFile};

#[derive(Clone, Copy, ValueEnum)]
pub enum TodayArg {
    /// Today counts only once it is a good day
    Good,
    /// Today counts as soon as anything is logged
    Entry,
}

impl From<TodayArg> for TodayPolicy {
    fn from(arg: TodayArg) -> Self {
        match arg {
            TodayArg::Good => TodayPolicy::RequireGood,
            TodayArg::Entry => TodayPolicy::AnyEntry,
        }
    }
}

#[derive(Args)]
pub struct CalcArgs {
    /// JSON log: a day map or an array of timestamped entries
    #[arg(long)]
    log: PathBuf,
    /// Minimum rounded amount for a good day
    #[arg(long, conflicts_with = "best_level")]
    threshold: Option<f64>,
    /// Level key that makes a day good (e.g. "steady")
    #[arg(long)]
    best_level: Option<String>,
    /// UTC offset defining day boundaries
    #[arg(long, default_value = "+00:00", allow_hyphen_values = true)]
    offset: String,
    /// Entries before this local hour count for the previous day
    #[arg(long)]
    cutoff: Option<u8>,
    /// Evaluation instant (RFC 3339), defaults to now
    #[arg(long)]
    now: Option<String>,
    #[arg(long, value_enum, default_value_t = TodayArg::Good)]
    today_policy: TodayArg,
    /// Include the per-day trace
    #[arg(long)]
    trace: bool,
}

#[derive(Serialize)]
struct CalcOutput<'a> {
    #[serde(flatten)]
    result: StreakResult,
    available_rewards: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    longest_streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<&'a [DayRecord]>,
}

pub fn run(args: CalcArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rule = match (args.threshold, args.best_level) {
        (Some(threshold), _) => GoodDayRule::minimum_amount(threshold),
        (None, Some(level)) => GoodDayRule::best_level(level),
        (None, None) => GoodDayRule::default(),
    };
    rule.validate()?;

    let calendar = DayCalendar::from_offset_str(&args.offset)?;
    let assignment = args
        .cutoff
        .map(DayAssignment::cutoff)
        .transpose()?
        .unwrap_or_default();
    let now = parse_now(args.now.as_deref())?;

    let log: DailyLog = match read_log(&args.log)? {
        LogFile::Days(log) => log,
        LogFile::Entries(entries) => DailyLog::from_entries(&entries, &calendar, assignment)?,
    };

    let engine = StreakEngine::new().with_today_policy(args.today_policy.into());
    let cap = engine.policy().reward_cap;

    let json = if args.trace {
        let report = engine.evaluate(&log, &rule, &calendar, now);
        serde_json::to_string_pretty(&CalcOutput {
            result: report.result,
            available_rewards: report.result.available_rewards_capped(cap),
            longest_streak: Some(report.longest_streak),
            days: Some(&report.days),
        })?
    } else {
        let result = engine.calculate(&log, &rule, &calendar, now);
        serde_json::to_string_pretty(&CalcOutput {
            result,
            available_rewards: result.available_rewards_capped(cap),
            longest_streak: None,
            days: None,
        })?
    };
    println!("{json}");
    Ok(())
}
