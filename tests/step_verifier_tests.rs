use merkle_replay::core::scenario::ScenarioDefaults;
use merkle_replay::core::step::compute_all_steps;
use merkle_replay::test_utils::{fixture_document, ScenarioFixture};
use merkle_replay::{compute_step, DemoCatalog, Scenario, Side};

fn scenario(fixture: ScenarioFixture) -> Scenario {
    Scenario::from_raw("t", fixture.build(), &ScenarioDefaults::default())
}

#[test]
fn test_right_child_step_orders_children() {
    let s = scenario(ScenarioFixture::new(2, 16).target(1).with_signature());
    let replay = s.replay.as_ref().unwrap();
    assert_eq!(replay.path.len(), 2);

    let r = compute_step(&s, 0).unwrap();
    assert_eq!(r.node_index, 1);
    assert_eq!(r.side, Side::Right);
    assert_eq!(r.sibling_index, 0);
    assert_eq!(r.parent_index, 0);
    assert_eq!(r.left_value, replay.auth_path[0].sibling_value);
    assert_eq!(r.right_value, replay.path[0].node_value);
    assert_eq!(r.parent_match, Some(true));
    assert_eq!(r.parent_diff_at_byte, None);
}

#[test]
fn test_left_child_step_orders_children() {
    let s = scenario(ScenarioFixture::new(3, 16).target(4));
    let r = compute_step(&s, 0).unwrap();
    assert_eq!(r.side, Side::Left);
    assert_eq!(r.left_value, s.replay.as_ref().unwrap().path[0].node_value);
    assert_eq!(r.sibling_index, 5);
    assert_eq!(r.parent_index, 2);
}

#[test]
fn test_parent_expected_is_the_tree_node() {
    let s = scenario(ScenarioFixture::new(3, 16).target(6));
    for r in compute_all_steps(&s) {
        let parent = r.parent_expected.as_ref().unwrap();
        let node = s.node_at(r.level + 1, r.parent_index).unwrap();
        assert_eq!(parent.value, node.value);
        assert_eq!(parent.level, r.level + 1);
        assert!(parent.key.is_some());
        assert!(parent.masked_left.is_some());
    }
}

#[test]
fn test_without_signature_parent_match_is_unset() {
    let s = scenario(ScenarioFixture::new(3, 16).target(6));
    let r = compute_step(&s, 1).unwrap();
    assert!(r.parent_from_auth.is_none());
    assert_eq!(r.parent_match, None);
    assert_eq!(r.sibling_match, None);
}

#[test]
fn test_corrupted_sibling_fails_from_that_level() {
    let catalog = DemoCatalog::load(fixture_document()).unwrap();
    let s = catalog.scenario("corrupted_sig").unwrap();
    let results = compute_all_steps(s);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].parent_match, Some(true));
    assert_eq!(results[1].parent_match, Some(true));
    assert_eq!(results[2].parent_match, Some(false));
    assert_eq!(results[2].parent_diff_at_byte, Some(0));
    assert_eq!(results[2].sibling_match, Some(false));
    assert_eq!(results[1].sibling_match, Some(true));
}

#[test]
fn test_wrong_message_fails_every_level() {
    let catalog = DemoCatalog::load(fixture_document()).unwrap();
    let s = catalog.scenario("wrong_msg").unwrap();
    assert!(compute_all_steps(s).iter().all(|r| r.parent_match == Some(false)));
}

#[test]
fn test_out_of_range_and_degraded_steps() {
    let catalog = DemoCatalog::load(fixture_document()).unwrap();
    let ok = catalog.scenario("ok").unwrap();
    assert!(compute_step(ok, 3).is_none());
    assert!(compute_step(ok, usize::MAX).is_none());
    let info = catalog.scenario("idx_monotonic").unwrap();
    assert!(compute_step(info, 0).is_none());
    assert!(compute_all_steps(info).is_empty());
}

#[test]
fn test_compute_step_is_deterministic() {
    let catalog = DemoCatalog::load(fixture_document()).unwrap();
    let s = catalog.scenario("corrupted_sig").unwrap();
    for i in 0..=s.max_step() {
        assert_eq!(compute_step(s, i), compute_step(s, i));
    }
}
