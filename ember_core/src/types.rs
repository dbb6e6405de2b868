//! Core domain types for the Ember tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Per-day cigarette counters with reason tags and coping strategies
//! - Reduction plans and their stages
//! - Challenge subscriptions
//! - The user profile

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.into()))
}

// ============================================================================
// Day Counters
// ============================================================================

/// Time-of-day bucket a cigarette is counted in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "morning" | "am" => Ok(Period::Morning),
            "afternoon" => Ok(Period::Afternoon),
            "evening" | "pm" | "night" => Ok(Period::Evening),
            other => Err(Error::Other(format!(
                "Unknown period '{}', expected morning, afternoon or evening",
                other
            ))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Morning => "morning",
            Period::Afternoon => "afternoon",
            Period::Evening => "evening",
        };
        f.write_str(s)
    }
}

/// Aggregate counts and labels for one calendar date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCounters {
    pub date: NaiveDate,
    #[serde(default)]
    pub morning: u32,
    #[serde(default)]
    pub afternoon: u32,
    #[serde(default)]
    pub evening: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<String>,
}

impl DayCounters {
    /// A zeroed record for `date`
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            morning: 0,
            afternoon: 0,
            evening: 0,
            tags: Vec::new(),
            strategies: Vec::new(),
        }
    }

    /// Sum of the three buckets, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.morning
            .saturating_add(self.afternoon)
            .saturating_add(self.evening)
    }

    pub fn count(&self, period: Period) -> u32 {
        match period {
            Period::Morning => self.morning,
            Period::Afternoon => self.afternoon,
            Period::Evening => self.evening,
        }
    }

    fn slot(&mut self, period: Period) -> &mut u32 {
        match period {
            Period::Morning => &mut self.morning,
            Period::Afternoon => &mut self.afternoon,
            Period::Evening => &mut self.evening,
        }
    }

    pub fn increment(&mut self, period: Period) {
        let slot = self.slot(period);
        *slot = slot.saturating_add(1);
    }

    /// Decrement a counter, clamping at zero
    pub fn decrement(&mut self, period: Period) {
        let slot = self.slot(period);
        *slot = slot.saturating_sub(1);
    }

    /// Attach a reason tag. Returns false if it was already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        insert_label(&mut self.tags, tag)
    }

    /// Attach a coping strategy. Returns false if it was already present.
    pub fn add_strategy(&mut self, strategy: &str) -> bool {
        insert_label(&mut self.strategies, strategy)
    }
}

/// Order-preserving insert that rejects blanks and duplicates
pub(crate) fn insert_label(labels: &mut Vec<String>, label: &str) -> bool {
    let label = label.trim();
    if label.is_empty() || labels.iter().any(|l| l == label) {
        return false;
    }
    labels.push(label.to_string());
    true
}

// ============================================================================
// Reduction Plan
// ============================================================================

/// Reduction speed selector
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Slow,
    Moderate,
    Fast,
}

impl Pace {
    /// Days allotted to every stage except the final zero-cigarette stage
    pub fn days_per_stage(self) -> u32 {
        match self {
            Pace::Slow => 6,
            Pace::Moderate => 3,
            Pace::Fast => 1,
        }
    }
}

impl FromStr for Pace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Ok(Pace::Slow),
            "moderate" => Ok(Pace::Moderate),
            "fast" => Ok(Pace::Fast),
            other => Err(Error::Other(format!(
                "Unknown pace '{}', expected slow, moderate or fast",
                other
            ))),
        }
    }
}

/// Why the user wants to cut down. Descriptive only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Motivation {
    Health,
    Money,
    Family,
}

impl FromStr for Motivation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "health" => Ok(Motivation::Health),
            "money" => Ok(Motivation::Money),
            "family" => Ok(Motivation::Family),
            other => Err(Error::Other(format!(
                "Unknown motivation '{}', expected health, money or family",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

/// One step of a reduction plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    pub id: u32,
    pub from: u32,
    pub to: u32,
    pub duration: u32,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReductionPlan {
    pub pace: Pace,
    pub starting_cigarettes: u32,
    pub current_level: u32,
    pub stages: Vec<Stage>,
    pub created_date: NaiveDate,
    pub motivation: Motivation,
}

/// Compliance verdict for today against the active stage
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DailyStatus {
    Success,
    Warning,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyFeedback {
    pub status: DailyStatus,
    pub goal: u32,
}

// ============================================================================
// Challenges
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Active,
    Won,
    Lost,
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Won => "won",
            ChallengeStatus::Lost => "lost",
        };
        f.write_str(s)
    }
}

/// A challenge the user opted into
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribedChallenge {
    pub id: String,
    pub subscribed_date: NaiveDate,
    pub status: ChallengeStatus,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Running,
    Swimming,
}

/// User-level label vocabulary and workout log
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
    #[serde(default)]
    pub workout_dates: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DayCounters {
        DayCounters::new(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut d = day();
        d.decrement(Period::Evening);
        assert_eq!(d.evening, 0);

        d.increment(Period::Evening);
        d.increment(Period::Evening);
        d.decrement(Period::Evening);
        assert_eq!(d.evening, 1);
        assert_eq!(d.total(), 1);
    }

    #[test]
    fn test_total_saturates_on_oversized_record() {
        let d: DayCounters =
            serde_json::from_str(r#"{"date":"2024-03-10","morning":4294967295,"afternoon":1}"#)
                .unwrap();
        assert_eq!(d.total(), u32::MAX);
    }

    #[test]
    fn test_labels_reject_duplicates_and_keep_order() {
        let mut d = day();
        assert!(d.add_tag("coffee"));
        assert!(d.add_tag("stress"));
        assert!(!d.add_tag("coffee"));
        assert!(!d.add_tag("   "));
        assert_eq!(d.tags, vec!["coffee".to_string(), "stress".to_string()]);
    }

    #[test]
    fn test_day_serializes_iso_date() {
        let json = serde_json::to_string(&day()).unwrap();
        assert!(json.contains("\"date\":\"2024-03-10\""));
    }

    #[test]
    fn test_day_deserializes_without_optional_fields() {
        let d: DayCounters =
            serde_json::from_str(r#"{"date":"2024-03-10","morning":2}"#).unwrap();
        assert_eq!(d.morning, 2);
        assert_eq!(d.afternoon, 0);
        assert!(d.tags.is_empty());
        assert!(d.strategies.is_empty());
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!("Morning".parse::<Period>().unwrap(), Period::Morning);
        assert_eq!("fast".parse::<Pace>().unwrap(), Pace::Fast);
        assert_eq!("money".parse::<Motivation>().unwrap(), Motivation::Money);
        assert!("noon".parse::<Period>().is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_pace_days() {
        assert_eq!(Pace::Slow.days_per_stage(), 6);
        assert_eq!(Pace::Moderate.days_per_stage(), 3);
        assert_eq!(Pace::Fast.days_per_stage(), 1);
    }
}
