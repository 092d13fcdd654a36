//! Streak and joker calculation engine.
//!
//! Walks every calendar day from the first logged day up to the evaluation
//! boundary, in order, keeping a running streak and a small ledger of reward
//! tokens ("jokers"):
//!
//! - a good day extends the streak; every `milestone_interval`-th day earns a
//!   joker unless the cap is already on hand
//! - a gap first checks whether it would complete a milestone (and earns that
//!   joker), then spends a joker to count as a healed day
//! - a gap with no joker on hand resets streak and ledger to zero
//!
//! Today is optional: when today does not count yet the walk stops at
//! yesterday, so not having logged *yet* never breaks a streak.
//!
//! The engine is stateless. Results are re-derived from the full log on every
//! call and never depend on previous calls.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::DailyLog;
use crate::calendar::DayCalendar;
use crate::result::StreakResult;
use crate::rules::GoodDayRule;

/// Consecutive counted days needed to earn one joker.
pub const MILESTONE_INTERVAL_DAYS: u32 = 7;

/// Maximum number of unspent jokers held at once.
pub const REWARD_CAP: u32 = 3;

/// Milestone and cap parameters of the joker ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: u32,
    #[serde(default = "default_reward_cap")]
    pub reward_cap: u32,
}

fn default_milestone_interval() -> u32 {
    MILESTONE_INTERVAL_DAYS
}
fn default_reward_cap() -> u32 {
    REWARD_CAP
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            milestone_interval: MILESTONE_INTERVAL_DAYS,
            reward_cap: REWARD_CAP,
        }
    }
}

impl RewardPolicy {
    fn is_milestone(&self, streak: u32) -> bool {
        // A zero interval would make every day a milestone; treat it as "never".
        self.milestone_interval != 0 && streak != 0 && streak % self.milestone_interval == 0
    }
}

/// When today is part of the evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodayPolicy {
    /// Today counts only once it is a good day.
    #[default]
    RequireGood,
    /// Today counts as soon as anything is logged for it, so a logged bad
    /// day is evaluated (and may spend a joker) right away.
    AnyEntry,
}

/// How a single day in the window was counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// Good day, streak extended
    Good,
    /// Gap covered by a joker, streak extended
    Healed,
    /// Gap without a joker, streak and ledger reset
    Reset,
}

/// One step of the walk, as observed after the day was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub day: NaiveDate,
    pub outcome: DayOutcome,
    pub streak: u32,
    pub rewards_earned: u32,
    pub rewards_consumed: u32,
    pub available_rewards: u32,
    /// A joker was earned on this day
    pub earned_reward: bool,
}

/// Result plus the per-day trace of the walk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakReport {
    pub result: StreakResult,
    /// Longest unbroken run seen inside the evaluation window
    pub longest_streak: u32,
    pub days: Vec<DayRecord>,
}

impl StreakReport {
    pub fn healed_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days
            .iter()
            .filter(|record| record.outcome == DayOutcome::Healed)
            .map(|record| record.day)
    }
}

/// Running state of the walk.
#[derive(Debug, Default)]
struct Ledger {
    streak: u32,
    earned: u32,
    consumed: u32,
    longest: u32,
}

impl Ledger {
    fn on_hand(&self) -> u32 {
        self.earned - self.consumed
    }

    fn result(&self) -> StreakResult {
        StreakResult {
            streak: self.streak,
            rewards_earned: self.earned,
            rewards_consumed: self.consumed,
        }
    }
}

/// Stateless streak calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakEngine {
    policy: RewardPolicy,
    today_policy: TodayPolicy,
}

impl StreakEngine {
    /// Engine with the standard 7-day milestone and cap of 3.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RewardPolicy) -> Self {
        Self {
            policy,
            today_policy: TodayPolicy::default(),
        }
    }

    pub fn with_today_policy(mut self, today_policy: TodayPolicy) -> Self {
        self.today_policy = today_policy;
        self
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    pub fn today_policy(&self) -> TodayPolicy {
        self.today_policy
    }

    /// Calculate streak and joker ledger for `log` as of `now`.
    ///
    /// `calendar` must be the calendar the log keys were normalized with.
    pub fn calculate(
        &self,
        log: &DailyLog,
        rule: &GoodDayRule,
        calendar: &DayCalendar,
        now: DateTime<Utc>,
    ) -> StreakResult {
        self.walk_log(log, rule, calendar, now, |_| {}).result()
    }

    /// Like [`calculate`](Self::calculate), also returning the per-day trace.
    pub fn evaluate(
        &self,
        log: &DailyLog,
        rule: &GoodDayRule,
        calendar: &DayCalendar,
        now: DateTime<Utc>,
    ) -> StreakReport {
        let mut days = Vec::new();
        let ledger = self.walk_log(log, rule, calendar, now, |record| days.push(*record));
        StreakReport {
            result: ledger.result(),
            longest_streak: ledger.longest,
            days,
        }
    }

    /// Calculate over an arbitrary predicate.
    ///
    /// `first_day` is the earliest logged day (`None` for an empty log). Today
    /// is included only when `is_good(today)` holds.
    pub fn calculate_with<F>(
        &self,
        first_day: Option<NaiveDate>,
        today: NaiveDate,
        is_good: F,
    ) -> StreakResult
    where
        F: Fn(NaiveDate) -> bool,
    {
        let include_today = is_good(today);
        let Some(range) = window(first_day, today, include_today) else {
            return StreakResult::ZERO;
        };
        self.walk(range, &is_good, |_| {}).result()
    }

    fn walk_log<O>(
        &self,
        log: &DailyLog,
        rule: &GoodDayRule,
        calendar: &DayCalendar,
        now: DateTime<Utc>,
        observe: O,
    ) -> Ledger
    where
        O: FnMut(&DayRecord),
    {
        let today = calendar.today(now);
        let include_today = match self.today_policy {
            TodayPolicy::RequireGood => rule.is_good(log.get(today)),
            TodayPolicy::AnyEntry => log.contains(today),
        };

        let Some(range) = window(log.first_day(), today, include_today) else {
            tracing::trace!(%today, "no days to evaluate");
            return Ledger::default();
        };

        let ledger = self.walk(range, |day| rule.is_good(log.get(day)), observe);
        tracing::debug!(
            start = %range.0,
            end = %range.1,
            streak = ledger.streak,
            earned = ledger.earned,
            consumed = ledger.consumed,
            "streak calculated"
        );
        ledger
    }

    fn walk<F, O>(&self, (start, end): (NaiveDate, NaiveDate), is_good: F, mut observe: O) -> Ledger
    where
        F: Fn(NaiveDate) -> bool,
        O: FnMut(&DayRecord),
    {
        let cap = self.policy.reward_cap;
        let mut ledger = Ledger::default();
        let mut day = start;

        loop {
            let mut earned_reward = false;
            let outcome = if is_good(day) {
                ledger.streak += 1;
                if self.policy.is_milestone(ledger.streak) && ledger.on_hand() < cap {
                    ledger.earned += 1;
                    earned_reward = true;
                }
                DayOutcome::Good
            } else {
                // Earn before consume: a gap on what would be a milestone day
                // earns that joker first.
                if self.policy.is_milestone(ledger.streak + 1) && ledger.on_hand() < cap {
                    ledger.earned += 1;
                    earned_reward = true;
                }

                if ledger.on_hand() > 0 {
                    ledger.consumed += 1;
                    ledger.streak += 1;
                    tracing::debug!(%day, streak = ledger.streak, "gap healed with joker");
                    DayOutcome::Healed
                } else {
                    if ledger.streak > 0 {
                        tracing::debug!(%day, lost = ledger.streak, "streak reset");
                    }
                    ledger.streak = 0;
                    ledger.earned = 0;
                    ledger.consumed = 0;
                    DayOutcome::Reset
                }
            };

            ledger.longest = ledger.longest.max(ledger.streak);
            observe(&DayRecord {
                day,
                outcome,
                streak: ledger.streak,
                rewards_earned: ledger.earned,
                rewards_consumed: ledger.consumed,
                available_rewards: ledger.on_hand().min(cap),
                earned_reward,
            });

            if day >= end {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        ledger
    }
}

/// Inclusive day range to walk, or `None` when there is nothing to evaluate.
fn window(
    first_day: Option<NaiveDate>,
    today: NaiveDate,
    include_today: bool,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = first_day?;
    let end = if include_today { today } else { today.pred_opt()? };
    (start <= end).then_some((start, end))
}
