//! Challenge subscription and evaluation.
//!
//! Evaluation is eager: every call resolves an active challenge to won or
//! lost using the predicate's value at that moment. A day-long goal can
//! therefore be lost by the first cigarette of the morning.

use crate::catalog::{get_default_catalog, ChallengeDefinition};
use crate::{ChallengeStatus, DayCounters, Error, Result, SubscribedChallenge};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// How far back the zero-day streak walks
pub const STREAK_LOOKBACK_DAYS: i64 = 365;

/// Resolution of a single evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Won,
    Lost,
}

impl From<ChallengeOutcome> for ChallengeStatus {
    fn from(outcome: ChallengeOutcome) -> Self {
        match outcome {
            ChallengeOutcome::Won => ChallengeStatus::Won,
            ChallengeOutcome::Lost => ChallengeStatus::Lost,
        }
    }
}

/// Consecutive zero-cigarette days ending at `today`
///
/// Prior days with no record count as zero days. The walk stops at the first
/// day with a positive total or after [`STREAK_LOOKBACK_DAYS`] days.
pub fn zero_day_streak(today: &DayCounters, history: &[DayCounters]) -> u32 {
    if today.total() > 0 {
        return 0;
    }

    let totals: HashMap<NaiveDate, u32> = history.iter().map(|d| (d.date, d.total())).collect();

    let mut streak = 1;
    for back in 1..=STREAK_LOOKBACK_DAYS {
        let date = today.date - Duration::days(back);
        match totals.get(&date) {
            Some(&total) if total > 0 => break,
            _ => streak += 1,
        }
    }

    streak
}

/// Run a definition's predicate
pub fn evaluate(
    definition: &ChallengeDefinition,
    today: &DayCounters,
    history: &[DayCounters],
) -> ChallengeOutcome {
    if (definition.predicate)(today, history) {
        ChallengeOutcome::Won
    } else {
        ChallengeOutcome::Lost
    }
}

/// Status for a catalog id; ids missing from the catalog stay active
pub fn check_challenge_status(
    id: &str,
    today: &DayCounters,
    history: &[DayCounters],
) -> ChallengeStatus {
    match get_default_catalog().get(id) {
        Some(def) => evaluate(def, today, history).into(),
        None => {
            tracing::warn!("No catalog entry for challenge '{}'", id);
            ChallengeStatus::Active
        }
    }
}

/// Opt into a challenge
///
/// Rejected while any challenge is active; the list is left untouched in
/// that case. A previous won/lost entry for the same id is replaced.
pub fn subscribe(
    subscriptions: &mut Vec<SubscribedChallenge>,
    id: &str,
    today: NaiveDate,
) -> Result<SubscribedChallenge> {
    if get_default_catalog().get(id).is_none() {
        return Err(Error::UnknownChallenge(id.into()));
    }

    if let Some(active) = subscriptions
        .iter()
        .find(|c| c.status == ChallengeStatus::Active)
    {
        tracing::info!(
            "Refusing to subscribe to '{}': '{}' is still active",
            id,
            active.id
        );
        return Err(Error::ChallengeAlreadyActive(active.id.clone()));
    }

    subscriptions.retain(|c| c.id != id);

    let entry = SubscribedChallenge {
        id: id.to_string(),
        subscribed_date: today,
        status: ChallengeStatus::Active,
    };
    subscriptions.push(entry.clone());

    tracing::info!("Subscribed to challenge '{}'", id);
    Ok(entry)
}

/// Drop a subscription regardless of its status. Returns whether one was removed.
pub fn unsubscribe(subscriptions: &mut Vec<SubscribedChallenge>, id: &str) -> bool {
    let before = subscriptions.len();
    subscriptions.retain(|c| c.id != id);
    let removed = subscriptions.len() != before;
    if removed {
        tracing::info!("Unsubscribed from challenge '{}'", id);
    }
    removed
}

/// Evaluate every active subscription and resolve it in place
///
/// Returns the entries whose status changed.
pub fn evaluate_active(
    subscriptions: &mut [SubscribedChallenge],
    today: &DayCounters,
    history: &[DayCounters],
) -> Vec<SubscribedChallenge> {
    let mut changed = Vec::new();

    for entry in subscriptions
        .iter_mut()
        .filter(|c| c.status == ChallengeStatus::Active)
    {
        let status = check_challenge_status(&entry.id, today, history);
        if status != entry.status {
            tracing::info!("Challenge '{}' resolved as {}", entry.id, status);
            entry.status = status;
            changed.push(entry.clone());
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(date: NaiveDate, morning: u32, afternoon: u32, evening: u32) -> DayCounters {
        DayCounters {
            morning,
            afternoon,
            evening,
            ..DayCounters::new(date)
        }
    }

    /// `zeros` smoke-free days ending today, preceded by one smoking day
    fn history_with_zero_run(today: NaiveDate, zeros: i64) -> Vec<DayCounters> {
        let mut days: Vec<DayCounters> = (0..zeros)
            .map(|back| day(today - Duration::days(back), 0, 0, 0))
            .collect();
        days.push(day(today - Duration::days(zeros), 1, 0, 0));
        days
    }

    fn status_of(id: &str, today: &DayCounters, history: &[DayCounters]) -> ChallengeStatus {
        check_challenge_status(id, today, history)
    }

    #[test]
    fn test_streak_zero_when_smoked_today() {
        let today = day(date(2024, 5, 20), 0, 1, 0);
        assert_eq!(zero_day_streak(&today, &[]), 0);
    }

    #[test]
    fn test_streak_stops_at_first_smoking_day() {
        let t = date(2024, 5, 20);
        let history = history_with_zero_run(t, 6);
        let today = history[0].clone();
        assert_eq!(zero_day_streak(&today, &history), 6);
        assert_eq!(status_of("hard_multi_days", &today, &history), ChallengeStatus::Lost);

        let history = history_with_zero_run(t, 7);
        assert_eq!(zero_day_streak(&today, &history), 7);
        assert_eq!(status_of("hard_multi_days", &today, &history), ChallengeStatus::Won);
    }

    #[test]
    fn test_streak_counts_missing_days_up_to_lookback() {
        let today = day(date(2024, 5, 20), 0, 0, 0);
        assert_eq!(zero_day_streak(&today, &[]), 366);
        assert_eq!(status_of("hard_radical", &today, &[]), ChallengeStatus::Won);
    }

    #[test]
    fn test_radical_needs_thirty_days() {
        let t = date(2024, 5, 20);
        let history = history_with_zero_run(t, 29);
        let today = history[0].clone();
        assert_eq!(status_of("hard_radical", &today, &history), ChallengeStatus::Lost);

        let history = history_with_zero_run(t, 30);
        assert_eq!(status_of("hard_radical", &today, &history), ChallengeStatus::Won);
    }

    #[test]
    fn test_hard_day_resolves_immediately() {
        let t = date(2024, 5, 20);
        assert_eq!(status_of("hard_day", &day(t, 0, 0, 0), &[]), ChallengeStatus::Won);
        assert_eq!(status_of("hard_day", &day(t, 1, 0, 0), &[]), ChallengeStatus::Lost);
    }

    #[test]
    fn test_single_day_predicates() {
        let t = date(2024, 5, 20);
        let heavy = day(t, 2, 3, 4);
        let light = day(t, 0, 2, 1);

        assert_eq!(status_of("easy_reduction", &heavy, &[]), ChallengeStatus::Won);
        assert_eq!(status_of("easy_hydration", &heavy, &[]), ChallengeStatus::Won);
        assert_eq!(status_of("medium_substitution", &heavy, &[]), ChallengeStatus::Won);

        assert_eq!(status_of("easy_no_smoke", &heavy, &[]), ChallengeStatus::Lost);
        assert_eq!(status_of("easy_no_smoke", &light, &[]), ChallengeStatus::Won);

        assert_eq!(status_of("medium_reduction", &heavy, &[]), ChallengeStatus::Lost);
        assert_eq!(status_of("medium_reduction", &light, &[]), ChallengeStatus::Won);

        assert_eq!(status_of("medium_pause", &heavy, &[]), ChallengeStatus::Lost);
        assert_eq!(status_of("medium_pause", &light, &[]), ChallengeStatus::Won);
    }

    #[test]
    fn test_unknown_id_stays_active() {
        let today = day(date(2024, 5, 20), 0, 0, 0);
        assert_eq!(status_of("mystery", &today, &[]), ChallengeStatus::Active);
    }

    #[test]
    fn test_subscribe_rejected_while_one_is_active() {
        let t = date(2024, 5, 20);
        let mut subs = Vec::new();
        subscribe(&mut subs, "hard_day", t).unwrap();
        let before = subs.clone();

        let err = subscribe(&mut subs, "easy_no_smoke", t).unwrap_err();
        assert!(matches!(err, Error::ChallengeAlreadyActive(ref id) if id == "hard_day"));
        assert_eq!(subs, before);
    }

    #[test]
    fn test_subscribe_after_resolution_and_resubscribe() {
        let t = date(2024, 5, 20);
        let mut subs = Vec::new();
        subscribe(&mut subs, "hard_day", t).unwrap();
        subs[0].status = ChallengeStatus::Lost;

        subscribe(&mut subs, "easy_no_smoke", t).unwrap();
        assert_eq!(subs.len(), 2);
        subs[1].status = ChallengeStatus::Won;

        let again = subscribe(&mut subs, "hard_day", date(2024, 5, 21)).unwrap();
        assert_eq!(again.status, ChallengeStatus::Active);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs.iter().filter(|c| c.id == "hard_day").count(), 1);
    }

    #[test]
    fn test_subscribe_unknown_challenge() {
        let mut subs = Vec::new();
        let err = subscribe(&mut subs, "nonexistent", date(2024, 5, 20)).unwrap_err();
        assert!(matches!(err, Error::UnknownChallenge(_)));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_unsubscribe_unconditional() {
        let t = date(2024, 5, 20);
        let mut subs = Vec::new();
        subscribe(&mut subs, "medium_pause", t).unwrap();
        assert!(unsubscribe(&mut subs, "medium_pause"));
        assert!(subs.is_empty());
        assert!(!unsubscribe(&mut subs, "medium_pause"));
    }

    #[test]
    fn test_evaluate_active_only_touches_active_entries() {
        let t = date(2024, 5, 20);
        let mut subs = vec![
            SubscribedChallenge {
                id: "easy_no_smoke".into(),
                subscribed_date: t,
                status: ChallengeStatus::Won,
            },
            SubscribedChallenge {
                id: "hard_day".into(),
                subscribed_date: t,
                status: ChallengeStatus::Active,
            },
        ];

        let changed = evaluate_active(&mut subs, &day(t, 1, 0, 0), &[]);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, "hard_day");
        assert_eq!(subs[0].status, ChallengeStatus::Won);
        assert_eq!(subs[1].status, ChallengeStatus::Lost);

        // Nothing active left
        assert!(evaluate_active(&mut subs, &day(t, 0, 0, 0), &[]).is_empty());
    }
}
