// src/lib.rs

//! Step-by-step replay of Merkle authentication-path verification.
//!
//! A JSON snapshot holds a set of named scenarios, each with a full tree, the
//! node path from a signed leaf to the root, and the co-path siblings used on
//! the way up. [`DemoCatalog`] validates and shares them;
//! [`compute_step`] reconstructs what happens at each level;
//! [`PlaybackController`] moves a cursor through the steps, by hand or on a
//! timer.
//!
//! ```
//! use std::sync::Arc;
//! use merkle_replay::{loader, PlaybackController};
//!
//! let catalog = loader::load_from_str(&merkle_replay::test_utils::fixture_json()).unwrap();
//! let mut controller = PlaybackController::new(Arc::new(catalog)).unwrap();
//! controller.scrub_to(i64::MAX);
//! assert_eq!(controller.outcome(), merkle_replay::Outcome::Verified);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod loader;
pub mod playback;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

pub use crate::config::Config;
pub use crate::core::{
    compute_step, first_divergent_byte, DataError, DemoCatalog, Digest, Scenario,
    ScenarioStatus, ScenarioSummary, StepResult,
};
pub use crate::core::details::{node_details, scenario_report, NodeDetails, ScenarioReport};
pub use crate::core::merkle::{NodeKey, Side};
pub use crate::error::{ReplayError, Result};
pub use crate::playback::{PlaybackController, PlaybackView, TickOutcome, TimerHandle};
#[cfg(feature = "async")]
pub use crate::playback::player::Player;
pub use crate::types::{Highlight, LogLevel, Outcome, PlaybackState};

/// Loads configuration and installs the console logger.
///
/// `config_path` defaults to `config.toml` in the working directory; a
/// missing file falls back to defaults.
///
/// # Errors
///
/// Returns [`ReplayError::ConfigError`] for an unusable configuration and
/// [`ReplayError::InvalidInput`] if a global logger is already installed.
pub fn init(config_path: Option<&str>) -> Result<Config> {
    let config = Config::load(config_path.unwrap_or("config.toml"))?;

    #[cfg(feature = "logging")]
    {
        if config.logging.console {
            env_logger::Builder::new()
                .filter_level(config.logging.level.to_level_filter())
                .parse_default_env()
                .try_init()
                .map_err(|e| {
                    ReplayError::invalid_input(format!("Logger already initialized: {}", e))
                })?;
        }
    }

    log::info!(
        "merkle-replay {} initialised (snapshot: {})",
        env!("CARGO_PKG_VERSION"),
        config.data.snapshot_path
    );
    Ok(config)
}
