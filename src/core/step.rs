// src/core/step.rs

//! Per-step parent reconstruction.
//!
//! A step pairs the path node at level `i` with its co-path sibling, orders
//! them into left and right children, and puts the recorded parent next to
//! the parent value recovered from the signature. Values are compared as
//! given; nothing is rehashed.

use serde::Serialize;

use crate::core::diff::first_divergent_byte;
use crate::core::hash::Digest;
use crate::core::merkle::{AuthPathEntry, NodeKey, Side};
use crate::core::scenario::Scenario;

/// The recorded parent of a step and its masking material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentExpected {
    pub level: u32,
    pub index: u64,
    pub key: Option<Digest>,
    pub bm0: Option<Digest>,
    pub bm1: Option<Digest>,
    pub masked_left: Option<Digest>,
    pub masked_right: Option<Digest>,
    pub value: Digest,
}

/// Everything shown for one replay step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step: usize,
    pub level: u32,
    pub node_index: u64,
    pub sibling_level: u32,
    pub sibling_index: u64,
    /// Side of the path node under its parent.
    pub side: Side,
    pub left_value: Digest,
    pub right_value: Digest,
    pub parent_index: u64,
    pub parent_expected: Option<ParentExpected>,
    pub parent_from_auth: Option<Digest>,
    /// Only set when both parent values are known.
    pub parent_match: Option<bool>,
    /// First differing byte when `parent_match` is false.
    pub parent_diff_at_byte: Option<usize>,
    pub sibling_used: Option<AuthPathEntry>,
    pub sibling_match: Option<bool>,
}

/// Computes step `step` of `scenario`.
///
/// Returns `None` for non-interactive scenarios and for `step >= len(path)`.
pub fn compute_step(scenario: &Scenario, step: usize) -> Option<StepResult> {
    let replay = scenario.replay.as_ref()?;
    let cur = replay.path.get(step)?;
    let sib = replay.auth_path.get(step)?;

    let side = Side::of(cur.node_index);
    let (left_value, right_value) = match side {
        Side::Left => (cur.node_value.clone(), sib.sibling_value.clone()),
        Side::Right => (sib.sibling_value.clone(), cur.node_value.clone()),
    };

    let parent_key = NodeKey::new(step as u32 + 1, cur.node_index / 2);
    let parent_expected = replay.tree.node(parent_key).map(|node| {
        let masked = node.masked.clone().unwrap_or_default();
        ParentExpected {
            level: node.level,
            index: node.index,
            key: masked.key,
            bm0: masked.bm0,
            bm1: masked.bm1,
            masked_left: masked.masked_left,
            masked_right: masked.masked_right,
            value: node.value.clone(),
        }
    });

    let parent_from_auth = scenario
        .auth_nodes
        .as_ref()
        .and_then(|nodes| nodes.get(step))
        .map(|n| n.value.clone());

    let (parent_match, parent_diff_at_byte) = match (&parent_expected, &parent_from_auth) {
        (Some(expected), Some(observed)) => {
            let matched = *observed == expected.value;
            let diff = if matched {
                None
            } else {
                first_divergent_byte(expected.value.as_hex(), observed.as_hex())
            };
            (Some(matched), diff)
        }
        _ => (None, None),
    };

    let sibling_used = scenario
        .auth_path_used
        .as_ref()
        .and_then(|used| used.get(step))
        .cloned();
    let sibling_match = sibling_used
        .as_ref()
        .map(|used| used.sibling_value == sib.sibling_value);

    Some(StepResult {
        step,
        level: cur.level,
        node_index: cur.node_index,
        sibling_level: sib.level,
        sibling_index: sib.sibling_index,
        side,
        left_value,
        right_value,
        parent_index: parent_key.index,
        parent_expected,
        parent_from_auth,
        parent_match,
        parent_diff_at_byte,
        sibling_used,
        sibling_match,
    })
}

/// All steps of a scenario, leaf to root.
pub fn compute_all_steps(scenario: &Scenario) -> Vec<StepResult> {
    let count = scenario.replay.as_ref().map_or(0, |r| r.step_count());
    (0..count).filter_map(|i| compute_step(scenario, i)).collect()
}
