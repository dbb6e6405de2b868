//! Built-in challenge catalog.
//!
//! Three challenges per difficulty tier, each with a deterministic win
//! predicate over today's counters and the full day history.

use crate::challenge::zero_day_streak;
use crate::types::*;
use once_cell::sync::Lazy;
use std::fmt;

/// Win condition: is the goal met given today's counters and all history
pub type Predicate = fn(&DayCounters, &[DayCounters]) -> bool;

/// A catalog challenge definition
#[derive(Clone)]
pub struct ChallengeDefinition {
    pub id: &'static str,
    pub difficulty: Difficulty,
    pub title: &'static str,
    pub description: &'static str,
    pub predicate: Predicate,
}

impl fmt::Debug for ChallengeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeDefinition")
            .field("id", &self.id)
            .field("difficulty", &self.difficulty)
            .finish_non_exhaustive()
    }
}

/// The complete set of challenges offered to the user
#[derive(Clone, Debug)]
pub struct ChallengeCatalog {
    pub challenges: Vec<ChallengeDefinition>,
}

/// Cached default catalog
static DEFAULT_CATALOG: Lazy<ChallengeCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ChallengeCatalog {
    &DEFAULT_CATALOG
}

impl ChallengeCatalog {
    pub fn get(&self, id: &str) -> Option<&ChallengeDefinition> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &ChallengeDefinition> {
        self.challenges
            .iter()
            .filter(move |c| c.difficulty == difficulty)
    }

    /// Validate catalog integrity
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, def) in self.challenges.iter().enumerate() {
            if def.id.is_empty() {
                errors.push(format!("Challenge #{} has an empty id", i));
            }
            if self.challenges[..i].iter().any(|c| c.id == def.id) {
                errors.push(format!("Duplicate challenge id '{}'", def.id));
            }
        }

        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            if self.by_difficulty(difficulty).next().is_none() {
                errors.push(format!("Catalog has no {} challenges", difficulty));
            }
        }

        errors
    }
}

/// Builds the default catalog
///
/// Prefer [`get_default_catalog`] outside tests.
pub fn build_default_catalog() -> ChallengeCatalog {
    let challenges = vec![
        // ====================================================================
        // Easy
        // ====================================================================
        ChallengeDefinition {
            id: "easy_reduction",
            difficulty: Difficulty::Easy,
            title: "One less",
            description: "Smoke one cigarette fewer than your average today.",
            // Tracking the day counts as a win.
            predicate: |_today, _history| true,
        },
        ChallengeDefinition {
            id: "easy_no_smoke",
            difficulty: Difficulty::Easy,
            title: "Smoke-free wake up",
            description: "Don't smoke for two hours after waking up.",
            predicate: |today, _history| today.morning == 0,
        },
        ChallengeDefinition {
            id: "easy_hydration",
            difficulty: Difficulty::Easy,
            title: "Water first",
            description: "Drink a glass of water whenever a craving hits.",
            predicate: |_today, _history| true,
        },
        // ====================================================================
        // Medium
        // ====================================================================
        ChallengeDefinition {
            id: "medium_reduction",
            difficulty: Difficulty::Medium,
            title: "Half the dose",
            description: "Cut your daily consumption in half.",
            predicate: |today, _history| today.total() <= 3,
        },
        ChallengeDefinition {
            id: "medium_pause",
            difficulty: Difficulty::Medium,
            title: "Work hours pause",
            description: "No smoking during work or study hours.",
            predicate: |today, _history| today.afternoon <= 2,
        },
        ChallengeDefinition {
            id: "medium_substitution",
            difficulty: Difficulty::Medium,
            title: "Swap it out",
            description: "Replace a cigarette with exercise or a relaxation break.",
            predicate: |_today, _history| true,
        },
        // ====================================================================
        // Hard
        // ====================================================================
        ChallengeDefinition {
            id: "hard_day",
            difficulty: Difficulty::Hard,
            title: "Full day",
            description: "Don't smoke for one full day.",
            predicate: |today, _history| today.total() == 0,
        },
        ChallengeDefinition {
            id: "hard_multi_days",
            difficulty: Difficulty::Hard,
            title: "Smoke-free week",
            description: "Don't smoke for 7 days in a row.",
            predicate: |today, history| zero_day_streak(today, history) >= 7,
        },
        ChallengeDefinition {
            id: "hard_radical",
            difficulty: Difficulty::Hard,
            title: "Quit",
            description: "Stay smoke-free for 30 days in a row.",
            predicate: |today, history| zero_day_streak(today, history) >= 30,
        },
    ];

    ChallengeCatalog { challenges }
}
