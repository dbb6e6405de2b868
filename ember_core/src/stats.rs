//! Aggregation helpers over the day history.
//!
//! Report surfaces consume these directly: zero-filled weekly and monthly
//! windows, totals and averages, label frequencies, and the time elapsed
//! since the last cigarette.

use crate::{DayCounters, Period};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Coarse rating of a day's total
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileLevel {
    Bad,
    Medium,
    Good,
    ReadyForPerfection,
}

pub fn profile_level(total: u32) -> ProfileLevel {
    match total {
        0 => ProfileLevel::ReadyForPerfection,
        1..=3 => ProfileLevel::Good,
        4..=7 => ProfileLevel::Medium,
        _ => ProfileLevel::Bad,
    }
}

fn by_date(history: &[DayCounters]) -> HashMap<NaiveDate, &DayCounters> {
    history.iter().map(|d| (d.date, d)).collect()
}

/// Records for every date in `first..=last`, zero-filled where missing
fn window(history: &[DayCounters], first: NaiveDate, last: NaiveDate) -> Vec<DayCounters> {
    let index = by_date(history);
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| {
            index
                .get(&d)
                .map(|&day| day.clone())
                .unwrap_or_else(|| DayCounters::new(d))
        })
        .collect()
}

/// The seven days ending at `end`, oldest first
pub fn week_window(history: &[DayCounters], end: NaiveDate) -> Vec<DayCounters> {
    window(history, end - Duration::days(6), end)
}

/// Every day of the calendar month containing `day`
pub fn month_window(history: &[DayCounters], day: NaiveDate) -> Vec<DayCounters> {
    let first = day.with_day(1).unwrap_or(day);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    window(history, first, last)
}

pub fn total_cigarettes(days: &[DayCounters]) -> u32 {
    days.iter()
        .map(DayCounters::total)
        .fold(0, u32::saturating_add)
}

pub fn average_cigarettes(days: &[DayCounters]) -> f64 {
    if days.is_empty() {
        return 0.0;
    }
    f64::from(total_cigarettes(days)) / days.len() as f64
}

pub fn max_cigarettes(days: &[DayCounters]) -> u32 {
    days.iter().map(DayCounters::total).max().unwrap_or(0)
}

/// Totals per time-of-day bucket
pub fn period_totals(days: &[DayCounters]) -> BTreeMap<String, u32> {
    [Period::Morning, Period::Afternoon, Period::Evening]
        .into_iter()
        .map(|p| {
            let total = days.iter().map(|d| d.count(p)).fold(0, u32::saturating_add);
            (p.to_string(), total)
        })
        .collect()
}

fn frequency<'a>(labels: impl Iterator<Item = &'a String>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of days each tag was attached to
pub fn tag_frequency(days: &[DayCounters]) -> BTreeMap<String, usize> {
    frequency(days.iter().flat_map(|d| d.tags.iter()))
}

/// Number of days each strategy was attached to
pub fn strategy_frequency(days: &[DayCounters]) -> BTreeMap<String, usize> {
    frequency(days.iter().flat_map(|d| d.strategies.iter()))
}

/// Share of each label in percent (one decimal), most frequent first
pub fn frequency_percentages(counts: &BTreeMap<String, usize>) -> Vec<(String, f64)> {
    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<(String, f64)> = counts
        .iter()
        .map(|(label, &n)| {
            let pct = (n as f64 / total as f64 * 1000.0).round() / 10.0;
            (label.clone(), pct)
        })
        .collect();
    shares.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    shares
}

/// Elapsed time split into display units
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct TimeSince {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

/// Time since the last cigarette; None if none was ever recorded
pub fn time_since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<TimeSince> {
    let elapsed = (now - last?).num_seconds().max(0);
    Some(TimeSince {
        days: elapsed / 86_400,
        hours: elapsed % 86_400 / 3_600,
        minutes: elapsed % 3_600 / 60,
        seconds: elapsed % 60,
    })
}

/// Weekly, monthly and all-history summary
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Report {
    pub weekly_total: u32,
    pub weekly_average: f64,
    pub monthly_total: u32,
    pub monthly_average: f64,
    pub yearly_total: u32,
    pub yearly_average: f64,
    pub max_day: u32,
    pub period_totals: BTreeMap<String, u32>,
    pub tag_frequency: BTreeMap<String, usize>,
    pub strategy_frequency: BTreeMap<String, usize>,
}

/// Build the summary shown in reports
///
/// The yearly figures cover the whole stored history.
pub fn build_report(history: &[DayCounters], today: NaiveDate) -> Report {
    let week = week_window(history, today);
    let month = month_window(history, today);

    Report {
        weekly_total: total_cigarettes(&week),
        weekly_average: average_cigarettes(&week),
        monthly_total: total_cigarettes(&month),
        monthly_average: average_cigarettes(&month),
        yearly_total: total_cigarettes(history),
        yearly_average: average_cigarettes(history),
        max_day: max_cigarettes(history),
        period_totals: period_totals(history),
        tag_frequency: tag_frequency(history),
        strategy_frequency: strategy_frequency(history),
    }
}
