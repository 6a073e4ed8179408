// src/core/merkle.rs

use serde::Serialize;

use crate::core::hash::Digest;

/// Scheme parameters of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parameters {
    /// Digest length in bytes.
    pub n: u32,
    /// Winternitz base (informational, never recomputed here).
    pub w: u32,
    /// Tree height; the tree has `2^h` leaves.
    pub h: u32,
}

impl Parameters {
    /// Number of leaves, `2^h`.
    pub fn leaf_count(&self) -> u64 {
        1u64 << self.h
    }

    /// Number of nodes expected at `level`, `2^(h - level)`.
    pub fn nodes_at(&self, level: u32) -> Option<u64> {
        (level <= self.h).then(|| 1u64 << (self.h - level))
    }
}

/// Structured address of a node: level (0 = leaves) and index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub level: u32,
    pub index: u64,
}

impl NodeKey {
    pub fn new(level: u32, index: u64) -> Self {
        Self { level, index }
    }

    /// The other child of this node's parent.
    pub fn sibling(&self) -> Self {
        Self::new(self.level, self.index ^ 1)
    }

    /// The node one level up that this node feeds into.
    pub fn parent(&self) -> Self {
        Self::new(self.level + 1, self.index / 2)
    }

    /// Which side of its parent this node sits on.
    pub fn side(&self) -> Side {
        Side::of(self.index)
    }
}

/// Position of a child under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Even indices are left children, odd indices right children.
    pub fn of(index: u64) -> Self {
        if index % 2 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Masking material recorded for an internal node.
///
/// `Node = H(key, (left xor bm0) || (right xor bm1))`; the snapshot carries
/// every term so the replay can show them without hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaskedInputs {
    pub key: Option<Digest>,
    pub bm0: Option<Digest>,
    pub bm1: Option<Digest>,
    pub masked_left: Option<Digest>,
    pub masked_right: Option<Digest>,
}

impl MaskedInputs {
    pub fn is_empty(&self) -> bool {
        self.key.is_none()
            && self.bm0.is_none()
            && self.bm1.is_none()
            && self.masked_left.is_none()
            && self.masked_right.is_none()
    }
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub level: u32,
    pub index: u64,
    pub value: Digest,
    /// Present on internal nodes only.
    #[serde(flatten)]
    pub masked: Option<MaskedInputs>,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.level, self.index)
    }
}

/// A fully materialized tree, indexed `levels[level][index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tree {
    levels: Vec<Vec<Node>>,
}

impl Tree {
    /// Wraps already validated levels.
    pub(crate) fn from_levels(levels: Vec<Vec<Node>>) -> Self {
        Self { levels }
    }

    /// Number of levels, `h + 1` for a valid tree.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Nodes of one level.
    pub fn level(&self, level: u32) -> Option<&[Node]> {
        self.levels.get(level as usize).map(Vec::as_slice)
    }

    /// Looks a node up by address. Absence is not an error.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        let index = usize::try_from(key.index).ok()?;
        self.levels.get(key.level as usize)?.get(index)
    }

    /// The single node of the top level.
    pub fn root(&self) -> Option<&Node> {
        self.levels.last()?.first()
    }

    /// All nodes, leaves first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.levels.iter().flatten()
    }
}

/// A node on the route from the signed leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub level: u32,
    pub node_index: u64,
    pub node_value: Digest,
}

impl PathEntry {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.level, self.node_index)
    }
}

/// A co-path node needed to rebuild the parent at `level + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthPathEntry {
    pub level: u32,
    pub sibling_index: u64,
    pub sibling_value: Digest,
}

impl AuthPathEntry {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.level, self.sibling_index)
    }
}

/// A parent value recomputed from a signature, supplied by the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthNode {
    pub level: u32,
    pub value: Digest,
}
