// src/core/details.rs

//! Node inspection and the end-of-replay report.

use serde::Serialize;

use crate::core::diff::first_divergent_byte;
use crate::core::hash::Digest;
use crate::core::merkle::{MaskedInputs, Node, NodeKey};
use crate::core::scenario::{OperationalChecks, Scenario};

/// Where a node sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Hash of a one-time public key (L-tree output).
    Leaf,
    /// Masked hash of two children.
    Internal,
    Root,
}

/// One level of the authentication trail of the signed leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthTrailStep {
    pub level: u32,
    pub sibling_index: u64,
    pub sibling_value: Digest,
    pub parent_index: u64,
    pub parent: Option<Node>,
}

/// Everything known about one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
    pub level: u32,
    pub index: u64,
    pub role: NodeRole,
    pub value: Digest,
    pub masked: Option<MaskedInputs>,
    /// True for the leaf at `target_idx`.
    pub is_target: bool,
    /// Filled for the signed leaf only; other leaves have no recorded path.
    pub auth_trail: Option<Vec<AuthTrailStep>>,
}

/// Details of node `(level, index)`, or `None` if the scenario has no such node.
pub fn node_details(scenario: &Scenario, level: u32, index: u64) -> Option<NodeDetails> {
    let replay = scenario.replay.as_ref()?;
    let node = replay.tree.node(NodeKey::new(level, index))?;
    let top = replay.tree.level_count().saturating_sub(1) as u32;

    let role = if level == top {
        NodeRole::Root
    } else if level == 0 {
        NodeRole::Leaf
    } else {
        NodeRole::Internal
    };
    let is_target = level == 0 && index == replay.target_idx;

    let auth_trail = is_target.then(|| {
        let mut cur = index;
        replay
            .auth_path
            .iter()
            .enumerate()
            .map(|(k, sibling)| {
                let parent_index = cur / 2;
                cur = parent_index;
                AuthTrailStep {
                    level: sibling.level,
                    sibling_index: sibling.sibling_index,
                    sibling_value: sibling.sibling_value.clone(),
                    parent_index,
                    parent: replay.tree.node(NodeKey::new(k as u32 + 1, parent_index)).cloned(),
                }
            })
            .collect()
    });

    Some(NodeDetails {
        level,
        index,
        role,
        value: node.value.clone(),
        masked: node.masked.clone(),
        is_target,
        auth_trail,
    })
}

/// An expected digest next to the one recovered from the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub expected: Digest,
    pub observed: Digest,
    pub matched: bool,
    /// Only computed for mismatches.
    pub diff_at_byte: Option<usize>,
}

impl Comparison {
    /// `matched` is the recorded verdict when present, plain equality otherwise.
    fn new(expected: &Digest, observed: &Digest, recorded: Option<bool>) -> Self {
        let matched = recorded.unwrap_or(expected == observed);
        let diff_at_byte = if matched {
            None
        } else {
            first_divergent_byte(expected.as_hex(), observed.as_hex())
        };
        Comparison {
            expected: expected.clone(),
            observed: observed.clone(),
            matched,
            diff_at_byte,
        }
    }
}

/// Final verdict of a scenario, shown once the replay reaches the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub key: String,
    pub label: String,
    pub note: Option<String>,
    pub msg: Option<String>,
    pub mp: Option<String>,
    pub verify: Option<bool>,
    pub error: Option<String>,
    pub leaf: Option<Comparison>,
    pub root: Option<Comparison>,
    pub checks: OperationalChecks,
}

impl ScenarioReport {
    /// True when the report records any failed comparison or verification.
    pub fn has_failure(&self) -> bool {
        self.verify == Some(false)
            || self.leaf.as_ref().is_some_and(|c| !c.matched)
            || self.root.as_ref().is_some_and(|c| !c.matched)
    }
}

pub fn scenario_report(scenario: &Scenario) -> ScenarioReport {
    let o = &scenario.outcome;
    let leaf = match (&o.leaf_expected, &o.leaf_from_auth) {
        (Some(e), Some(f)) => Some(Comparison::new(e, f, o.leaf_match)),
        _ => None,
    };
    let root = match (&o.root_expected, &o.root_from_auth) {
        (Some(e), Some(f)) => Some(Comparison::new(e, f, o.root_match)),
        _ => None,
    };
    ScenarioReport {
        key: scenario.key.clone(),
        label: scenario.label.clone(),
        note: scenario.note.clone(),
        msg: scenario.msg.clone(),
        mp: scenario.mp.clone(),
        verify: o.verify,
        error: scenario.error.clone(),
        leaf,
        root,
        checks: scenario.checks.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scenario::ScenarioDefaults;
    use crate::test_utils::ScenarioFixture;

    fn scenario(fixture: ScenarioFixture) -> Scenario {
        Scenario::from_raw("t", fixture.build(), &ScenarioDefaults::default())
    }

    #[test]
    fn test_target_leaf_has_auth_trail() {
        let s = scenario(ScenarioFixture::new(3, 8).target(5));
        let d = node_details(&s, 0, 5).unwrap();
        assert_eq!(d.role, NodeRole::Leaf);
        assert!(d.is_target);
        let trail = d.auth_trail.unwrap();
        let parents: Vec<_> = trail.iter().map(|t| t.parent_index).collect();
        assert_eq!(parents, vec![2, 1, 0]);
        let siblings: Vec<_> = trail.iter().map(|t| t.sibling_index).collect();
        assert_eq!(siblings, vec![4, 3, 0]);
        assert_eq!(trail[2].parent.as_ref().map(|p| p.level), Some(3));
    }

    #[test]
    fn test_other_nodes() {
        let s = scenario(ScenarioFixture::new(3, 8).target(5));
        let leaf = node_details(&s, 0, 4).unwrap();
        assert!(!leaf.is_target);
        assert!(leaf.auth_trail.is_none());
        assert!(leaf.masked.is_none());

        let inner = node_details(&s, 1, 0).unwrap();
        assert_eq!(inner.role, NodeRole::Internal);
        assert!(inner.masked.is_some());

        assert_eq!(node_details(&s, 3, 0).unwrap().role, NodeRole::Root);
        assert!(node_details(&s, 1, 4).is_none());
    }

    #[test]
    fn test_report_for_passing_scenario() {
        let s = scenario(ScenarioFixture::new(2, 8).label("Valid").with_signature());
        let r = scenario_report(&s);
        assert_eq!(r.label, "Valid");
        assert!(r.leaf.as_ref().unwrap().matched);
        assert!(r.root.as_ref().unwrap().matched);
        assert!(r.root.as_ref().unwrap().diff_at_byte.is_none());
        assert!(!r.has_failure());
    }

    #[test]
    fn test_report_locates_divergence() {
        let s = scenario(ScenarioFixture::new(2, 8).wrong_message());
        let r = scenario_report(&s);
        let leaf = r.leaf.unwrap();
        assert!(!leaf.matched);
        assert_eq!(leaf.diff_at_byte, Some(0));
        let root = r.root.unwrap();
        assert!(!root.matched);
        assert_eq!(root.diff_at_byte, Some(0));
        assert_eq!(r.verify, Some(false));
    }

    #[test]
    fn test_report_without_comparisons() {
        let s = scenario(ScenarioFixture::new(2, 8));
        let r = scenario_report(&s);
        assert!(r.leaf.is_none() && r.root.is_none());
        assert!(r.checks.is_empty());
        assert!(!r.has_failure());
    }
}
