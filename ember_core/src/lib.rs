#![forbid(unsafe_code)]

//! Core domain model and business logic for the Ember reduction tracker.
//!
//! This crate provides:
//! - Domain types (day counters, plans, stages, challenges, profile)
//! - Reduction plan engine
//! - Challenge catalog and evaluation
//! - Persistence (key-value store with safe defaults)
//! - Statistics and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod export;
pub mod logging;
pub mod plan;
pub mod stats;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, ChallengeCatalog, ChallengeDefinition};
pub use challenge::{check_challenge_status, zero_day_streak, ChallengeOutcome};
pub use config::Config;
pub use export::export_history_csv;
pub use plan::{evaluate_today, generate_plan, today_goal, StageOutcome};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, Storage};
pub use tracker::Tracker;
