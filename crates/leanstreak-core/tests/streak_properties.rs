//! Property tests for the streak engine invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use leanstreak_core::{
    DailyLog, DayCalendar, DayOutcome, DayValue, GoodDayRule, StreakEngine, REWARD_CAP,
};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
}

/// Sparse log over the last `days.len()` days; index 0 is today.
fn build_log(days: &[Option<f64>]) -> DailyLog {
    let today = now().date_naive();
    days.iter()
        .enumerate()
        .filter_map(|(ago, amount)| {
            amount.map(|a| (today - Duration::days(ago as i64), DayValue::Amount(a)))
        })
        .collect()
}

fn day_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        3 => (0.0f64..10.0).prop_map(Some),
        1 => Just(None),
    ]
}

fn rule() -> GoodDayRule {
    GoodDayRule::minimum_amount(2.0)
}

proptest! {
    #[test]
    fn ledger_invariants_hold(days in prop::collection::vec(day_strategy(), 0..90)) {
        let log = build_log(&days);
        let result = StreakEngine::new().calculate(&log, &rule(), &DayCalendar::utc(), now());

        prop_assert!(result.rewards_consumed <= result.rewards_earned);
        let available = result.available_rewards();
        prop_assert_eq!(available, (result.rewards_earned - result.rewards_consumed).min(REWARD_CAP));
        prop_assert!(available <= REWARD_CAP);
    }

    #[test]
    fn calculation_is_idempotent(days in prop::collection::vec(day_strategy(), 0..90)) {
        let log = build_log(&days);
        let engine = StreakEngine::new();
        let first = engine.calculate(&log, &rule(), &DayCalendar::utc(), now());
        let second = engine.calculate(&log, &rule(), &DayCalendar::utc(), now());
        prop_assert_eq!(first, second);

        let report = engine.evaluate(&log, &rule(), &DayCalendar::utc(), now());
        prop_assert_eq!(report.result, first);
    }

    #[test]
    fn all_good_run_counts_every_day(len in 1usize..120, minutes in 2.0f64..60.0) {
        let days = vec![Some(minutes); len];
        let result = StreakEngine::new().calculate(&build_log(&days), &rule(), &DayCalendar::utc(), now());

        prop_assert_eq!(result.streak as usize, len);
        prop_assert_eq!(result.rewards_earned, ((len / 7) as u32).min(REWARD_CAP));
        prop_assert_eq!(result.rewards_consumed, 0);
    }

    #[test]
    fn unaffordable_gap_resets_ledger(days in prop::collection::vec(day_strategy(), 1..90)) {
        let report = StreakEngine::new().evaluate(&build_log(&days), &rule(), &DayCalendar::utc(), now());

        for record in &report.days {
            if record.outcome == DayOutcome::Reset {
                prop_assert_eq!(record.streak, 0);
                prop_assert_eq!(record.rewards_earned, 0);
                prop_assert_eq!(record.rewards_consumed, 0);
                prop_assert_eq!(record.available_rewards, 0);
            }
            prop_assert!(record.rewards_consumed <= record.rewards_earned);
            prop_assert!(record.available_rewards <= REWARD_CAP);
        }
    }

    #[test]
    fn streak_matches_unbroken_chain(days in prop::collection::vec(day_strategy(), 1..90)) {
        let report = StreakEngine::new().evaluate(&build_log(&days), &rule(), &DayCalendar::utc(), now());

        let last = report.days.last();
        prop_assert_eq!(last.map_or(0, |r| r.rewards_earned), report.result.rewards_earned);
        prop_assert_eq!(last.map_or(0, |r| r.rewards_consumed), report.result.rewards_consumed);

        let chain = report
            .days
            .iter()
            .rev()
            .take_while(|record| record.outcome != DayOutcome::Reset)
            .count();
        prop_assert_eq!(report.result.streak as usize, chain);
        prop_assert!(report.longest_streak >= report.result.streak);
    }
}
