// src/core/catalog.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::merkle::Node;
use crate::core::scenario::{DataError, Scenario, ScenarioDefaults};
use crate::core::snapshot::SnapshotDocument;
use crate::error::Result as ReplayResult;

/// One row of the scenario overview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    pub key: String,
    pub label: String,
    pub verify: Option<bool>,
    pub root_match: Option<bool>,
    pub interactive: bool,
    /// Note, error and operational check flags, in that order.
    pub notes: Vec<String>,
}

/// The immutable set of scenarios loaded from one snapshot.
///
/// Scenarios are shared as `Arc<Scenario>` so any number of viewers can read
/// them without locking. Listing order is the order of the document.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    scenarios: Vec<Arc<Scenario>>,
    by_key: HashMap<String, usize>,
}

impl DemoCatalog {
    /// Builds a catalog from a parsed snapshot.
    ///
    /// Each scenario is validated on its own; one that breaks the tree or path
    /// invariants is kept as degraded and the rest load normally.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NoScenarios`] if the document has no `demos`
    /// entries.
    pub fn load(snapshot: SnapshotDocument) -> ReplayResult<Self> {
        let defaults = ScenarioDefaults {
            params: snapshot.params,
            target_idx: snapshot.target_idx,
            pub_seed: snapshot.pub_seed,
            root: snapshot.root,
        };
        let demos = snapshot.demos.unwrap_or_default();
        if demos.is_empty() {
            return Err(DataError::NoScenarios.into());
        }

        let mut scenarios = Vec::with_capacity(demos.len());
        let mut by_key = HashMap::with_capacity(demos.len());
        for (key, value) in demos {
            let scenario = Scenario::from_value(&key, value, &defaults);
            match scenario.data_error() {
                None => log::debug!("Scenario '{}' ready ({} steps)", key, scenario.max_step() + 1),
                Some(e) if e.is_missing_data() => {
                    log::info!("Scenario '{}' is not replayable: {}", key, e)
                }
                Some(e) => log::warn!("Scenario '{}' degraded: {}", key, e),
            }
            by_key.insert(key, scenarios.len());
            scenarios.push(Arc::new(scenario));
        }

        log::info!(
            "Loaded catalog with {} scenarios ({} replayable)",
            scenarios.len(),
            scenarios.iter().filter(|s| s.is_interactive()).count()
        );
        Ok(Self { scenarios, by_key })
    }

    /// Looks a scenario up by key.
    pub fn scenario(&self, key: &str) -> Option<&Arc<Scenario>> {
        self.by_key.get(key).map(|&i| &self.scenarios[i])
    }

    /// The first scenario in listing order.
    pub fn first(&self) -> Option<&Arc<Scenario>> {
        self.scenarios.first()
    }

    /// Scenario keys in listing order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.key.as_str())
    }

    /// Scenarios in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios that could not be made interactive, with the reason.
    pub fn degraded(&self) -> impl Iterator<Item = (&str, &DataError)> {
        self.scenarios
            .iter()
            .filter_map(|s| s.data_error().map(|e| (s.key.as_str(), e)))
    }

    /// Node lookup; `None` for unknown addresses or non-interactive scenarios.
    pub fn node_at<'a>(&self, scenario: &'a Scenario, level: u32, index: u64) -> Option<&'a Node> {
        scenario.node_at(level, index)
    }

    /// `h + 1` for a replayable scenario.
    pub fn level_count(&self, scenario: &Scenario) -> Option<usize> {
        scenario.level_count()
    }

    /// The overview table, one row per scenario.
    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.scenarios
            .iter()
            .map(|s| {
                let mut notes = Vec::new();
                if let Some(note) = &s.note {
                    notes.push(note.clone());
                }
                if let Some(error) = &s.error {
                    notes.push(format!("error: {}", error));
                }
                if let Some(v) = s.checks.idx_monotonic {
                    notes.push(format!("idx_monotonic: {}", v));
                }
                if let Some(v) = s.checks.exhausted {
                    notes.push(format!("exhausted: {}", v));
                }
                if let Some(v) = s.checks.rollback_same_idx {
                    notes.push(format!("rollback_same_idx: {}", v));
                }
                ScenarioSummary {
                    key: s.key.clone(),
                    label: s.label.clone(),
                    verify: s.outcome.verify,
                    root_match: s.outcome.root_match,
                    interactive: s.is_interactive(),
                    notes,
                }
            })
            .collect()
    }
}
