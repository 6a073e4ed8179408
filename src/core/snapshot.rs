// src/core/snapshot.rs

//! Wire shape of a replay snapshot.
//!
//! These structures mirror the JSON document written by the upstream dump
//! tool field for field. Nothing here is validated: digests are plain strings
//! and every field is optional, so that one malformed scenario cannot prevent
//! the others from loading. [`Scenario`](crate::core::scenario::Scenario) is
//! the validated counterpart.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scheme parameters as written in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParams {
    /// Digest length in bytes.
    pub n: u32,
    /// Winternitz parameter.
    pub w: u32,
    /// Tree height.
    pub h: u32,
}

/// One node of a tree level. Leaves carry only `index` and `value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub index: u64,
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm0: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_right: Option<String>,
}

/// One level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLevel {
    pub level: u32,
    /// Address height used when the level was hashed (`level - 1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_height: Option<u32>,
    pub nodes: Vec<RawNode>,
}

/// The materialized tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTree {
    pub levels: Vec<RawLevel>,
}

/// A node on the route from the signed leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPathEntry {
    pub level: u32,
    pub node_index: u64,
    pub node_value: String,
}

/// A co-path node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuthPathEntry {
    pub level: u32,
    pub sibling_index: u64,
    pub sibling_value: String,
}

/// A chain value recomputed from a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuthNode {
    pub level: u32,
    pub value: String,
}

/// One entry of the `demos` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawScenario {
    pub label: Option<String>,
    pub note: Option<String>,
    pub error: Option<String>,
    pub msg: Option<String>,
    pub mp: Option<String>,
    pub verify: Option<bool>,

    pub params: Option<RawParams>,
    pub target_idx: Option<u64>,
    pub pub_seed: Option<String>,
    pub root: Option<String>,
    pub tree: Option<RawTree>,
    pub path: Option<Vec<RawPathEntry>>,
    pub auth_path: Option<Vec<RawAuthPathEntry>>,
    pub auth_path_used: Option<Vec<RawAuthPathEntry>>,
    pub auth_nodes: Option<Vec<RawAuthNode>>,

    pub leaf_expected: Option<String>,
    pub leaf_from_auth: Option<String>,
    pub leaf_match: Option<bool>,
    pub root_expected: Option<String>,
    pub root_from_auth: Option<String>,
    pub root_match: Option<bool>,

    pub idx_values: Option<Vec<u64>>,
    pub idx_monotonic: Option<bool>,
    pub exhausted: Option<bool>,
    pub max_signatures: Option<u64>,
    pub rollback_same_idx: Option<bool>,
    pub rollback_idx: Option<u64>,
    pub rollback_sig1_ok: Option<bool>,
    pub rollback_sig2_ok: Option<bool>,
}

/// The whole document.
///
/// `demos` is kept as an untyped, order-preserving map; each entry is decoded
/// on its own while the catalog is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotDocument {
    pub params: Option<RawParams>,
    pub target_idx: Option<u64>,
    pub pub_seed: Option<String>,
    pub root: Option<String>,
    pub demos: Option<Map<String, Value>>,
}

impl SnapshotDocument {
    /// Number of entries in `demos`.
    pub fn scenario_count(&self) -> usize {
        self.demos.as_ref().map_or(0, Map::len)
    }
}
