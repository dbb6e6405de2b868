//! Error types for the ember_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ember_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A stored document could not be decoded and was left untouched
    #[error("Stored '{key}' is unreadable ({reason}); left untouched")]
    Corrupt { key: String, reason: String },

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plan inputs outside the supported domain
    #[error("Invalid plan parameters: starting cigarettes must be between {min} and {max}, got {got}")]
    InvalidPlanParameters { got: u32, min: u32, max: u32 },

    /// An operation needed a reduction plan but none is stored
    #[error("No reduction plan has been started")]
    NoActivePlan,

    /// Every stage of the plan has been closed
    #[error("The reduction plan is already finished")]
    PlanFinished,

    /// Challenge id not present in the catalog
    #[error("Unknown challenge: {0}")]
    UnknownChallenge(String),

    /// Another challenge is still active
    #[error("Challenge '{0}' is already active; finish or unsubscribe it first")]
    ChallengeAlreadyActive(String),

    /// Unparseable calendar date
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
