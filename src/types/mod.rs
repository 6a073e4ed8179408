//! Core type definitions for merkle-replay

mod log_level;
mod playback;

pub use crate::config::ConfigError;
pub use log_level::LogLevel;
pub use playback::{Highlight, Outcome, PlaybackState};
