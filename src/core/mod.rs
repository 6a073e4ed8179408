// src/core/mod.rs

/// Hex digest type shared by every snapshot value.
pub mod hash;
/// Tree model: parameters, nodes, structured node keys and path entries.
pub mod merkle;
/// Unvalidated wire shape of a snapshot document.
pub mod snapshot;
/// Validated scenarios and per-scenario data errors.
pub mod scenario;
/// The immutable scenario catalog.
pub mod catalog;
/// First divergent byte between two hex digests.
pub mod diff;
/// Per-step parent reconstruction and comparison.
pub mod step;
/// Node inspection and the final scenario report.
pub mod details;

pub use catalog::{DemoCatalog, ScenarioSummary};
pub use diff::first_divergent_byte;
pub use hash::Digest;
pub use scenario::{DataError, Scenario, ScenarioStatus};
pub use step::{compute_step, StepResult};
