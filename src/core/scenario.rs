// src/core/scenario.rs

//! Validated scenarios.
//!
//! A scenario is built from its [`RawScenario`] independently of the others.
//! If the replay data (tree, path, authentication path) is missing or breaks a
//! structural invariant, the scenario is kept with a
//! [`ScenarioStatus::Degraded`] status and no replay data; its descriptive
//! fields remain available.

use serde::Serialize;
use thiserror::Error;

use crate::core::hash::{Digest, DigestError};
use crate::core::merkle::{
    AuthNode, AuthPathEntry, MaskedInputs, Node, NodeKey, Parameters, PathEntry, Tree,
};
use crate::core::snapshot::{
    RawAuthNode, RawAuthPathEntry, RawLevel, RawNode, RawParams, RawPathEntry, RawScenario,
    RawTree,
};

/// Why a scenario could not be made interactive, or why a document has no
/// usable scenario at all.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DataError {
    /// The document has no `demos` entries.
    #[error("snapshot contains no scenarios")]
    NoScenarios,

    /// A field needed for replay is absent.
    #[error("missing {0}")]
    Missing(&'static str),

    /// The scenario entry does not have the expected shape.
    #[error("malformed scenario: {0}")]
    Malformed(String),

    /// Parameters are outside what a tree can hold.
    #[error("unsupported parameters: {0}")]
    UnsupportedParameters(String),

    /// `len(tree.levels) != h + 1`.
    #[error("tree has {found} levels, expected {expected}")]
    LevelCount { expected: usize, found: usize },

    /// Level `i` does not hold `2^(h-i)` nodes, or a node sits at the wrong index.
    #[error("level {level} has {found} nodes, expected {expected}")]
    LevelSize { level: u32, expected: u64, found: u64 },

    /// `len(path) != h`.
    #[error("path has {found} entries, expected {expected}")]
    PathLength { expected: usize, found: usize },

    /// `len(auth_path) != h`.
    #[error("auth_path has {found} entries, expected {expected}")]
    AuthPathLength { expected: usize, found: usize },

    /// `target_idx` is not a leaf index.
    #[error("target_idx {target_idx} out of range for {leaf_count} leaves")]
    TargetOutOfRange { target_idx: u64, leaf_count: u64 },

    /// A path or co-path entry does not follow the leaf-to-root index chain.
    #[error("index chain broken at step {step}: {reason}")]
    IndexChain { step: usize, reason: String },

    /// A digest field is not valid hex or has the wrong length.
    #[error("invalid digest in {field}: {reason}")]
    InvalidDigest { field: String, reason: String },
}

impl DataError {
    fn digest(field: impl Into<String>, err: DigestError) -> Self {
        DataError::InvalidDigest {
            field: field.into(),
            reason: err.to_string(),
        }
    }

    /// Missing-data degradations are expected for informational scenarios.
    pub fn is_missing_data(&self) -> bool {
        matches!(self, DataError::Missing(_))
    }
}

/// Whether a scenario can be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Ready,
    Degraded(DataError),
}

/// Tree and paths of a ready scenario, all invariants checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayData {
    pub params: Parameters,
    pub target_idx: u64,
    pub tree: Tree,
    pub path: Vec<PathEntry>,
    pub auth_path: Vec<AuthPathEntry>,
}

impl ReplayData {
    /// Number of replay steps, `h`.
    pub fn step_count(&self) -> usize {
        self.path.len()
    }
}

/// Comparison results recorded upstream when the signature was checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordedOutcome {
    pub verify: Option<bool>,
    pub leaf_expected: Option<Digest>,
    pub leaf_from_auth: Option<Digest>,
    pub leaf_match: Option<bool>,
    pub root_expected: Option<Digest>,
    pub root_from_auth: Option<Digest>,
    pub root_match: Option<bool>,
}

/// Operational checks some scenarios carry instead of (or next to) a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationalChecks {
    pub idx_values: Option<Vec<u64>>,
    pub idx_monotonic: Option<bool>,
    pub exhausted: Option<bool>,
    pub max_signatures: Option<u64>,
    pub rollback_same_idx: Option<bool>,
    pub rollback_idx: Option<u64>,
    pub rollback_sig1_ok: Option<bool>,
    pub rollback_sig2_ok: Option<bool>,
}

impl OperationalChecks {
    pub fn is_empty(&self) -> bool {
        *self == OperationalChecks::default()
    }
}

/// Document-level values that scenarios inherit when they omit them.
#[derive(Debug, Clone, Default)]
pub struct ScenarioDefaults {
    pub params: Option<RawParams>,
    pub target_idx: Option<u64>,
    pub pub_seed: Option<String>,
    pub root: Option<String>,
}

/// One named replay scenario. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub key: String,
    pub label: String,
    pub note: Option<String>,
    pub error: Option<String>,
    pub msg: Option<String>,
    /// Message digest fed to the one-time signature.
    pub mp: Option<String>,
    pub params: Option<Parameters>,
    pub target_idx: Option<u64>,
    pub pub_seed: Option<Digest>,
    pub root: Option<Digest>,
    pub replay: Option<ReplayData>,
    pub auth_path_used: Option<Vec<AuthPathEntry>>,
    pub auth_nodes: Option<Vec<AuthNode>>,
    pub outcome: RecordedOutcome,
    pub checks: OperationalChecks,
    pub status: ScenarioStatus,
}

impl Scenario {
    /// Builds a scenario from an undecoded `demos` entry.
    ///
    /// An entry that does not even decode becomes a degraded scenario carrying
    /// only its key.
    pub fn from_value(key: &str, value: serde_json::Value, defaults: &ScenarioDefaults) -> Self {
        match serde_json::from_value::<RawScenario>(value) {
            Ok(raw) => Self::from_raw(key, raw, defaults),
            Err(e) => Self::malformed(key, DataError::Malformed(e.to_string())),
        }
    }

    /// Builds a scenario from a decoded entry, validating the replay data.
    pub fn from_raw(key: &str, raw: RawScenario, defaults: &ScenarioDefaults) -> Self {
        let raw_params = raw.params.or(defaults.params);
        let target_idx = raw.target_idx.or(defaults.target_idx);
        let params = raw_params.map(|p| Parameters { n: p.n, w: p.w, h: p.h });

        let replay = build_replay(&raw, params, target_idx);

        // Observed values may legitimately be garbage (truncated signatures),
        // so an unparsable one is dropped rather than degrading the scenario.
        let outcome = RecordedOutcome {
            verify: raw.verify,
            leaf_expected: optional_digest(raw.leaf_expected.as_deref()),
            leaf_from_auth: optional_digest(raw.leaf_from_auth.as_deref()),
            leaf_match: raw.leaf_match,
            root_expected: optional_digest(raw.root_expected.as_deref()),
            root_from_auth: optional_digest(raw.root_from_auth.as_deref()),
            root_match: raw.root_match,
        };

        let (replay, auth_path_used, auth_nodes, status) = match replay {
            Ok(data) => match (
                convert_optional_auth_path(raw.auth_path_used.as_deref()),
                convert_optional_auth_nodes(raw.auth_nodes.as_deref()),
            ) {
                (Ok(used), Ok(nodes)) => (Some(data), used, nodes, ScenarioStatus::Ready),
                (Err(e), _) | (_, Err(e)) => (None, None, None, ScenarioStatus::Degraded(e)),
            },
            Err(e) => (None, None, None, ScenarioStatus::Degraded(e)),
        };

        Scenario {
            key: key.to_string(),
            label: raw.label.clone().unwrap_or_else(|| key.to_string()),
            note: raw.note,
            error: raw.error,
            msg: raw.msg,
            mp: raw.mp,
            params,
            target_idx,
            pub_seed: optional_digest(raw.pub_seed.as_deref().or(defaults.pub_seed.as_deref())),
            root: optional_digest(raw.root.as_deref().or(defaults.root.as_deref())),
            replay,
            auth_path_used,
            auth_nodes,
            outcome,
            checks: OperationalChecks {
                idx_values: raw.idx_values,
                idx_monotonic: raw.idx_monotonic,
                exhausted: raw.exhausted,
                max_signatures: raw.max_signatures,
                rollback_same_idx: raw.rollback_same_idx,
                rollback_idx: raw.rollback_idx,
                rollback_sig1_ok: raw.rollback_sig1_ok,
                rollback_sig2_ok: raw.rollback_sig2_ok,
            },
            status,
        }
    }

    fn malformed(key: &str, err: DataError) -> Self {
        Scenario {
            key: key.to_string(),
            label: key.to_string(),
            note: None,
            error: None,
            msg: None,
            mp: None,
            params: None,
            target_idx: None,
            pub_seed: None,
            root: None,
            replay: None,
            auth_path_used: None,
            auth_nodes: None,
            outcome: RecordedOutcome::default(),
            checks: OperationalChecks::default(),
            status: ScenarioStatus::Degraded(err),
        }
    }

    /// True when the scenario has validated replay data.
    pub fn is_interactive(&self) -> bool {
        self.replay.is_some()
    }

    /// The degradation reason, if any.
    pub fn data_error(&self) -> Option<&DataError> {
        match &self.status {
            ScenarioStatus::Ready => None,
            ScenarioStatus::Degraded(e) => Some(e),
        }
    }

    /// Highest step index; 0 for non-interactive scenarios.
    pub fn max_step(&self) -> usize {
        self.replay
            .as_ref()
            .map_or(0, |r| r.step_count().saturating_sub(1))
    }

    /// Looks a tree node up. Absence is not an error.
    pub fn node_at(&self, level: u32, index: u64) -> Option<&Node> {
        self.replay.as_ref()?.tree.node(NodeKey::new(level, index))
    }

    /// `h + 1` for ready scenarios.
    pub fn level_count(&self) -> Option<usize> {
        self.replay.as_ref().map(|r| r.tree.level_count())
    }
}

fn optional_digest(value: Option<&str>) -> Option<Digest> {
    value.filter(|s| !s.is_empty()).and_then(|s| Digest::parse(s).ok())
}

fn sized_digest(field: impl Into<String>, value: &str, n: u32) -> Result<Digest, DataError> {
    let field = field.into();
    let digest = Digest::parse(value).map_err(|e| DataError::digest(field.clone(), e))?;
    if digest.byte_len() != n as usize {
        return Err(DataError::InvalidDigest {
            field,
            reason: format!("expected {} bytes, found {}", n, digest.byte_len()),
        });
    }
    Ok(digest)
}

fn masked_field(field: String, value: Option<&str>, n: u32) -> Result<Option<Digest>, DataError> {
    value.map(|v| sized_digest(field, v, n)).transpose()
}

fn build_replay(
    raw: &RawScenario,
    params: Option<Parameters>,
    target_idx: Option<u64>,
) -> Result<ReplayData, DataError> {
    let tree = raw.tree.as_ref().ok_or(DataError::Missing("tree"))?;
    let path = raw.path.as_ref().ok_or(DataError::Missing("path"))?;
    let auth_path = raw.auth_path.as_ref().ok_or(DataError::Missing("auth_path"))?;
    let params = params.ok_or(DataError::Missing("params"))?;
    let target_idx = target_idx.ok_or(DataError::Missing("target_idx"))?;

    if params.h >= 63 {
        return Err(DataError::UnsupportedParameters(format!("h = {}", params.h)));
    }
    if params.n == 0 {
        return Err(DataError::UnsupportedParameters("n = 0".to_string()));
    }
    if target_idx >= params.leaf_count() {
        return Err(DataError::TargetOutOfRange {
            target_idx,
            leaf_count: params.leaf_count(),
        });
    }

    let tree = convert_tree(tree, params)?;
    let h = params.h as usize;
    if path.len() != h {
        return Err(DataError::PathLength { expected: h, found: path.len() });
    }
    if auth_path.len() != h {
        return Err(DataError::AuthPathLength { expected: h, found: auth_path.len() });
    }

    let path = path
        .iter()
        .enumerate()
        .map(|(i, p)| convert_path_entry(i, p, params.n))
        .collect::<Result<Vec<_>, _>>()?;
    let auth_path = auth_path
        .iter()
        .enumerate()
        .map(|(i, a)| convert_auth_entry(format!("auth_path[{}]", i), a, params.n))
        .collect::<Result<Vec<_>, _>>()?;

    check_index_chain(target_idx, &path, &auth_path)?;

    Ok(ReplayData { params, target_idx, tree, path, auth_path })
}

fn convert_tree(raw: &RawTree, params: Parameters) -> Result<Tree, DataError> {
    let expected_levels = params.h as usize + 1;
    if raw.levels.len() != expected_levels {
        return Err(DataError::LevelCount {
            expected: expected_levels,
            found: raw.levels.len(),
        });
    }
    let levels = raw
        .levels
        .iter()
        .enumerate()
        .map(|(level, l)| convert_level(level as u32, l, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Tree::from_levels(levels))
}

fn convert_level(level: u32, raw: &RawLevel, params: Parameters) -> Result<Vec<Node>, DataError> {
    let expected = params.nodes_at(level).unwrap_or(0);
    let found = raw.nodes.len() as u64;
    if raw.level != level || found != expected {
        return Err(DataError::LevelSize { level, expected, found });
    }
    raw.nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            if node.index != i as u64 {
                return Err(DataError::LevelSize { level, expected, found });
            }
            convert_node(level, node, params.n)
        })
        .collect()
}

fn convert_node(level: u32, raw: &RawNode, n: u32) -> Result<Node, DataError> {
    let at = |name: &str| format!("tree.levels[{}].nodes[{}].{}", level, raw.index, name);
    let value = raw.value.as_deref().ok_or(DataError::Missing("node value"))?;
    let value = sized_digest(at("value"), value, n)?;

    let masked = MaskedInputs {
        key: masked_field(at("key"), raw.key.as_deref(), n)?,
        bm0: masked_field(at("bm0"), raw.bm0.as_deref(), n)?,
        bm1: masked_field(at("bm1"), raw.bm1.as_deref(), n)?,
        masked_left: masked_field(at("masked_left"), raw.masked_left.as_deref(), n)?,
        masked_right: masked_field(at("masked_right"), raw.masked_right.as_deref(), n)?,
    };

    Ok(Node {
        level,
        index: raw.index,
        value,
        masked: (!masked.is_empty()).then_some(masked),
    })
}

fn convert_path_entry(step: usize, raw: &RawPathEntry, n: u32) -> Result<PathEntry, DataError> {
    Ok(PathEntry {
        level: raw.level,
        node_index: raw.node_index,
        node_value: sized_digest(format!("path[{}]", step), &raw.node_value, n)?,
    })
}

fn convert_auth_entry(field: String, raw: &RawAuthPathEntry, n: u32) -> Result<AuthPathEntry, DataError> {
    Ok(AuthPathEntry {
        level: raw.level,
        sibling_index: raw.sibling_index,
        sibling_value: sized_digest(field, &raw.sibling_value, n)?,
    })
}

// Entries recovered from a signature are compared, not trusted, so only
// their hex shape is checked here.
fn convert_optional_auth_path(
    raw: Option<&[RawAuthPathEntry]>,
) -> Result<Option<Vec<AuthPathEntry>>, DataError> {
    raw.map(|entries| {
        entries
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let field = format!("auth_path_used[{}]", i);
                Ok(AuthPathEntry {
                    level: a.level,
                    sibling_index: a.sibling_index,
                    sibling_value: Digest::parse(&a.sibling_value)
                        .map_err(|e| DataError::digest(field, e))?,
                })
            })
            .collect()
    })
    .transpose()
}

fn convert_optional_auth_nodes(raw: Option<&[RawAuthNode]>) -> Result<Option<Vec<AuthNode>>, DataError> {
    raw.map(|nodes| {
        nodes
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Ok(AuthNode {
                    level: a.level,
                    value: Digest::parse(&a.value)
                        .map_err(|e| DataError::digest(format!("auth_nodes[{}]", i), e))?,
                })
            })
            .collect()
    })
    .transpose()
}

fn check_index_chain(
    target_idx: u64,
    path: &[PathEntry],
    auth_path: &[AuthPathEntry],
) -> Result<(), DataError> {
    let mut expected = NodeKey::new(0, target_idx);
    for (step, (cur, sib)) in path.iter().zip(auth_path).enumerate() {
        if cur.key() != expected {
            return Err(DataError::IndexChain {
                step,
                reason: format!(
                    "path node is {}:{}, expected {}:{}",
                    cur.level, cur.node_index, expected.level, expected.index
                ),
            });
        }
        if sib.key() != expected.sibling() {
            return Err(DataError::IndexChain {
                step,
                reason: format!(
                    "sibling is {}:{}, expected {}:{}",
                    sib.level,
                    sib.sibling_index,
                    expected.level,
                    expected.index ^ 1
                ),
            });
        }
        expected = expected.parent();
    }
    Ok(())
}
