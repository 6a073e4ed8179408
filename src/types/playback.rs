//! Presentation-facing enums produced by the playback controller.

use serde::Serialize;
use strum::{Display, EnumString};

/// How a node is drawn at the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Not touched by the steps replayed so far
    #[default]
    Unvisited,
    /// On the route from the signed leaf to the root
    OnPath,
    /// A co-path sibling consumed so far
    Sibling,
}

/// Verdict shown for the scenario as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The replay has not reached the root yet, or nothing was recorded
    #[default]
    Unknown,
    /// The reconstructed root equals the public root
    Verified,
    /// The reconstructed root differs from the public root
    Failed,
}

impl Outcome {
    /// Maps a recorded `root_match` flag.
    pub fn from_root_match(root_match: Option<bool>) -> Self {
        match root_match {
            Some(true) => Outcome::Verified,
            Some(false) => Outcome::Failed,
            None => Outcome::Unknown,
        }
    }
}

/// Playback state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Resting on a step (paused)
    #[default]
    AtStep,
    /// Auto-advancing on a timer
    Playing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Highlight::OnPath.to_string(), "on_path");
        assert_eq!(Highlight::from_str("sibling").unwrap(), Highlight::Sibling);
        assert_eq!(Outcome::Failed.to_string(), "failed");
        assert_eq!(PlaybackState::AtStep.to_string(), "at_step");
        assert!(Outcome::from_str("maybe").is_err());
    }

    #[test]
    fn test_outcome_from_root_match() {
        assert_eq!(Outcome::from_root_match(Some(true)), Outcome::Verified);
        assert_eq!(Outcome::from_root_match(Some(false)), Outcome::Failed);
        assert_eq!(Outcome::from_root_match(None), Outcome::Unknown);
    }
}
