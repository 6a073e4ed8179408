//! Error types for merkle-replay
//!
//! `ReplayError` is the crate-wide error. Per-scenario data problems are
//! described by [`DataError`](crate::core::scenario::DataError); they degrade a
//! single scenario and only surface here when a whole document is unusable.
//! A digest mismatch is never an error: it is a regular outcome of a replay.

use thiserror::Error;

use crate::core::scenario::DataError;

/// Main error type for merkle-replay
#[derive(Error, Debug)]
pub enum ReplayError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error (JSON): {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    /// Snapshot data could not be turned into a catalog
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested scenario is not part of the catalog
    #[error("Scenario '{0}' not found")]
    ScenarioNotFound(String),

    /// Background playback task failed
    #[error("Playback task error: {0}")]
    Playback(String),
}

/// Result type alias for operations that can fail with a [ReplayError]
pub type Result<T> = std::result::Result<T, ReplayError>;

impl ReplayError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        ReplayError::InvalidInput(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        ReplayError::NotFound(what.into())
    }

    /// Create a new scenario-not-found error
    pub fn scenario_not_found<S: Into<String>>(key: S) -> Self {
        ReplayError::ScenarioNotFound(key.into())
    }
}

impl From<&str> for ReplayError {
    fn from(s: &str) -> Self {
        ReplayError::invalid_input(s)
    }
}

impl From<String> for ReplayError {
    fn from(s: String) -> Self {
        ReplayError::invalid_input(s)
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for ReplayError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReplayError::Playback(format!("Async task error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_pick_the_right_variant() {
        assert!(matches!(ReplayError::invalid_input("bad"), ReplayError::InvalidInput(ref s) if s == "bad"));
        assert!(matches!(ReplayError::not_found("x"), ReplayError::NotFound(ref s) if s == "x"));
        assert_eq!(
            ReplayError::scenario_not_found("ok").to_string(),
            "Scenario 'ok' not found"
        );
    }

    #[test]
    fn data_errors_convert() {
        let err: ReplayError = DataError::NoScenarios.into();
        assert!(matches!(err, ReplayError::Data(DataError::NoScenarios)));
    }
}
