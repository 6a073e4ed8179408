// src/test_utils.rs

//! Snapshot fixtures for tests and benchmarks.
//!
//! The fixtures hash with SHA-256 truncated to `n` bytes so that every masked
//! node is internally consistent, the way an upstream dump would be. Nothing
//! in the replay engine depends on this module.

use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};

use crate::core::snapshot::{
    RawAuthNode, RawAuthPathEntry, RawLevel, RawNode, RawParams, RawPathEntry, RawScenario,
    RawTree, SnapshotDocument,
};

fn sha256_truncated(parts: &[&[u8]], n: usize) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = hasher.finalize().to_vec();
    out.truncate(n);
    out
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

fn flip_first_bit(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    if let Some(first) = out.first_mut() {
        *first ^= 0x01;
    }
    out
}

/// Builds one consistent scenario entry.
#[derive(Debug, Clone)]
pub struct ScenarioFixture {
    h: u32,
    n: u32,
    w: u32,
    target_idx: u64,
    seed: Vec<u8>,
    label: Option<String>,
    signature: bool,
    wrong_message: bool,
    corrupt_chain_from: Option<usize>,
    corrupt_sibling_at: Option<usize>,
}

impl ScenarioFixture {
    /// Tree of height `h` with `n`-byte digests (`n` is capped at 32).
    pub fn new(h: u32, n: u32) -> Self {
        Self {
            h,
            n: n.clamp(1, 32),
            w: 16,
            target_idx: 0,
            seed: b"merkle-replay fixture".to_vec(),
            label: None,
            signature: false,
            wrong_message: false,
            corrupt_chain_from: None,
            corrupt_sibling_at: None,
        }
    }

    pub fn target(mut self, target_idx: u64) -> Self {
        self.target_idx = target_idx;
        self
    }

    pub fn seed(mut self, seed: &[u8]) -> Self {
        self.seed = seed.to_vec();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Adds the values a verifier recovered from a valid signature:
    /// `auth_path_used`, `auth_nodes` and the leaf/root comparisons.
    pub fn with_signature(mut self) -> Self {
        self.signature = true;
        self
    }

    /// The recovered leaf differs, so every chain value differs.
    pub fn wrong_message(mut self) -> Self {
        self.signature = true;
        self.wrong_message = true;
        self.corrupt_chain_from = Some(0);
        self
    }

    /// Recovered chain values differ from `step` upward.
    pub fn corrupt_chain_from(mut self, step: usize) -> Self {
        self.signature = true;
        self.corrupt_chain_from = Some(step);
        self
    }

    /// The signature carries a wrong sibling at `step`.
    pub fn corrupt_sibling_at(mut self, step: usize) -> Self {
        self.signature = true;
        self.corrupt_sibling_at = Some(step);
        self
    }

    fn pub_seed(&self) -> Vec<u8> {
        sha256_truncated(&[&self.seed, b"pub_seed"], self.n as usize)
    }

    fn prf(&self, pub_seed: &[u8], height: u32, index: u64, key_and_mask: u8) -> Vec<u8> {
        sha256_truncated(
            &[pub_seed, &height.to_be_bytes(), &index.to_be_bytes(), &[key_and_mask]],
            self.n as usize,
        )
    }

    pub fn build(&self) -> RawScenario {
        let n = self.n as usize;
        let pub_seed = self.pub_seed();
        let leaf_count = 1u64 << self.h;

        let leaves: Vec<Vec<u8>> = (0..leaf_count)
            .map(|i| sha256_truncated(&[&self.seed, b"leaf", &i.to_be_bytes()], n))
            .collect();
        let mut levels = vec![RawLevel {
            level: 0,
            tree_height: None,
            nodes: leaves
                .iter()
                .enumerate()
                .map(|(i, v)| RawNode {
                    index: i as u64,
                    value: Some(hex::encode(v)),
                    ..RawNode::default()
                })
                .collect(),
        }];
        let mut values = vec![leaves];

        for height in 0..self.h {
            let current = &values[height as usize];
            let mut next = Vec::with_capacity(current.len() / 2);
            let mut nodes = Vec::with_capacity(current.len() / 2);
            for (i, pair) in current.chunks(2).enumerate() {
                let index = i as u64;
                let key = self.prf(&pub_seed, height, index, 0);
                let bm0 = self.prf(&pub_seed, height, index, 1);
                let bm1 = self.prf(&pub_seed, height, index, 2);
                let masked_left = xor(&pair[0], &bm0);
                let masked_right = xor(&pair[1], &bm1);
                let value = sha256_truncated(&[&key, &masked_left, &masked_right], n);
                nodes.push(RawNode {
                    index,
                    value: Some(hex::encode(&value)),
                    left_index: Some(index * 2),
                    right_index: Some(index * 2 + 1),
                    key: Some(hex::encode(key)),
                    bm0: Some(hex::encode(bm0)),
                    bm1: Some(hex::encode(bm1)),
                    masked_left: Some(hex::encode(masked_left)),
                    masked_right: Some(hex::encode(masked_right)),
                });
                next.push(value);
            }
            levels.push(RawLevel {
                level: height + 1,
                tree_height: Some(height),
                nodes,
            });
            values.push(next);
        }

        let root = values[self.h as usize][0].clone();
        let mut path = Vec::new();
        let mut auth_path = Vec::new();
        let mut chain = Vec::new();
        let mut idx = self.target_idx;
        for level in 0..self.h {
            let row = &values[level as usize];
            path.push(RawPathEntry {
                level,
                node_index: idx,
                node_value: hex::encode(&row[idx as usize]),
            });
            auth_path.push(RawAuthPathEntry {
                level,
                sibling_index: idx ^ 1,
                sibling_value: hex::encode(&row[(idx ^ 1) as usize]),
            });
            chain.push(values[level as usize + 1][(idx / 2) as usize].clone());
            idx /= 2;
        }

        let mut raw = RawScenario {
            label: self.label.clone(),
            params: Some(RawParams { n: self.n, w: self.w, h: self.h }),
            target_idx: Some(self.target_idx),
            pub_seed: Some(hex::encode(&pub_seed)),
            root: Some(hex::encode(&root)),
            tree: Some(RawTree { levels }),
            path: Some(path.clone()),
            auth_path: Some(auth_path.clone()),
            ..RawScenario::default()
        };

        if self.signature {
            let corrupt_from = match (self.corrupt_chain_from, self.corrupt_sibling_at) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            let mut used = auth_path;
            if let Some(step) = self.corrupt_sibling_at {
                if let Some(entry) = used.get_mut(step) {
                    let bytes = hex::decode(&entry.sibling_value).unwrap_or_default();
                    entry.sibling_value = hex::encode(flip_first_bit(&bytes));
                }
            }
            let auth_nodes: Vec<RawAuthNode> = chain
                .iter()
                .enumerate()
                .map(|(level, value)| {
                    let value = match corrupt_from {
                        Some(from) if level >= from => flip_first_bit(value),
                        _ => value.clone(),
                    };
                    RawAuthNode { level: level as u32, value: hex::encode(value) }
                })
                .collect();

            let leaf = hex::decode(&path[0].node_value).unwrap_or_default();
            let leaf_from_auth = if self.wrong_message { flip_first_bit(&leaf) } else { leaf.clone() };
            let root_from_auth = auth_nodes
                .last()
                .map(|a| a.value.clone())
                .unwrap_or_else(|| hex::encode(&leaf_from_auth));
            let root_match = root_from_auth == hex::encode(&root);

            raw.verify = Some(root_match);
            raw.leaf_expected = Some(hex::encode(&leaf));
            raw.leaf_from_auth = Some(hex::encode(&leaf_from_auth));
            raw.leaf_match = Some(!self.wrong_message);
            raw.auth_path_used = Some(used);
            raw.auth_nodes = Some(auth_nodes);
            raw.root_expected = Some(hex::encode(&root));
            raw.root_from_auth = Some(root_from_auth);
            raw.root_match = Some(root_match);
            raw.mp = Some(hex::encode(sha256_truncated(&[&self.seed, b"mp"], n)));
        }
        raw
    }

    /// The entry as an untyped `demos` value.
    pub fn build_value(&self) -> Value {
        serde_json::to_value(self.build()).unwrap_or(Value::Null)
    }
}

/// A document with a passing, a failing, a wrong-message, an informational
/// and a truncated-signature scenario, in that order. `h = 3`, `n = 16`,
/// target leaf 5.
pub fn fixture_document() -> SnapshotDocument {
    let base = ScenarioFixture::new(3, 16).target(5);
    let ok = base.clone().label("Valid signature").with_signature().build();

    let mut demos = Map::new();
    demos.insert("ok".to_string(), serde_json::to_value(&ok).unwrap_or(Value::Null));
    demos.insert(
        "corrupted_sig".to_string(),
        base.clone().label("Corrupted signature").corrupt_sibling_at(2).build_value(),
    );
    demos.insert(
        "wrong_msg".to_string(),
        base.clone().label("Wrong message").wrong_message().build_value(),
    );
    demos.insert(
        "idx_monotonic".to_string(),
        serde_json::json!({
            "label": "Monotonic index over N signatures",
            "note": "Indices must be strictly increasing.",
            "idx_values": [0, 1, 2, 3],
            "idx_monotonic": true
        }),
    );

    // Full tree, but verification aborted before any root comparison.
    let mut trunc = base.clone().label("Truncated signature").build();
    trunc.verify = Some(false);
    trunc.error = Some("signature too short".to_string());
    demos.insert(
        "sig_trunc".to_string(),
        serde_json::to_value(&trunc).unwrap_or(Value::Null),
    );

    SnapshotDocument {
        params: ok.params,
        target_idx: ok.target_idx,
        pub_seed: ok.pub_seed.clone(),
        root: ok.root.clone(),
        demos: Some(demos),
    }
}

/// [`fixture_document`] rendered as JSON text.
pub fn fixture_json() -> String {
    serde_json::to_string_pretty(&fixture_document()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_chain_matches_tree() {
        let raw = ScenarioFixture::new(2, 8).target(1).with_signature().build();
        let tree = raw.tree.as_ref().unwrap();
        let nodes = raw.auth_nodes.as_ref().unwrap();
        assert_eq!(nodes[0].value, tree.levels[1].nodes[0].value.clone().unwrap());
        assert_eq!(nodes[1].value, tree.levels[2].nodes[0].value.clone().unwrap());
        assert_eq!(raw.root_match, Some(true));
    }

    #[test]
    fn test_corrupted_sibling_breaks_chain_from_that_step() {
        let raw = ScenarioFixture::new(3, 8).target(5).corrupt_sibling_at(1).build();
        let tree = raw.tree.as_ref().unwrap();
        let nodes = raw.auth_nodes.as_ref().unwrap();
        assert_eq!(nodes[0].value, tree.levels[1].nodes[2].value.clone().unwrap());
        assert_ne!(nodes[1].value, tree.levels[2].nodes[1].value.clone().unwrap());
        assert_eq!(raw.root_match, Some(false));
        assert_ne!(
            raw.auth_path_used.as_ref().unwrap()[1].sibling_value,
            raw.auth_path.as_ref().unwrap()[1].sibling_value
        );
    }

    #[test]
    fn test_fixture_document_lists_five_demos() {
        let doc = fixture_document();
        assert_eq!(doc.scenario_count(), 5);
        assert!(fixture_json().contains("\"corrupted_sig\""));
    }
}
