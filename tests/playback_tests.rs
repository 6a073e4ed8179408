use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use merkle_replay::test_utils::fixture_document;
use merkle_replay::{
    DemoCatalog, Highlight, NodeKey, Outcome, PlaybackController, PlaybackState, ReplayError,
    TickOutcome,
};

fn catalog() -> Arc<DemoCatalog> {
    Arc::new(DemoCatalog::load(fixture_document()).unwrap())
}

fn controller_on(key: &str) -> PlaybackController {
    PlaybackController::with_scenario(catalog(), key).unwrap()
}

#[test]
fn test_play_matches_manual_stepping() {
    for key in ["ok", "corrupted_sig", "wrong_msg"] {
        let mut manual = controller_on(key);
        let mut played = controller_on(key);

        let timer = played.play(Duration::from_millis(10)).unwrap();
        while let TickOutcome::Advanced(step) = played.tick(timer.id) {
            assert_eq!(manual.step_forward(), step);
            assert_eq!(played.highlights(), manual.highlights());
            assert_eq!(played.current_result(), manual.current_result());
        }

        assert_eq!(played.step(), manual.max_step());
        assert_eq!(played.state(), PlaybackState::AtStep);
        assert_eq!(played.outcome(), manual.outcome());
        assert_eq!(played.report(), manual.report());
    }
}

#[test]
fn test_forward_then_backward_round_trips() {
    let mut c = controller_on("corrupted_sig");
    c.scrub_to(1);
    let before = c.current_result();
    c.step_forward();
    c.step_backward();
    assert_eq!(c.step(), 1);
    assert_eq!(c.current_result(), before);
}

#[test]
fn test_scrub_clamps_to_valid_range() {
    let mut c = controller_on("ok");
    let max = c.max_step() as i64;
    assert_eq!(c.scrub_to(max + 5), c.max_step());
    assert_eq!(c.scrub_to(-3), 0);
}

#[test]
fn test_failed_outcome_only_at_the_end() {
    let mut c = controller_on("wrong_msg");
    for _ in 0..c.max_step() {
        assert_eq!(c.outcome(), Outcome::Unknown);
        c.step_forward();
    }
    assert_eq!(c.outcome(), Outcome::Failed);
    let report = c.report().unwrap();
    let leaf = report.leaf.unwrap();
    assert!(!leaf.matched);
    assert_eq!(leaf.diff_at_byte, Some(0));
}

#[test]
fn test_truncated_signature_ends_failed() {
    let mut c = controller_on("sig_trunc");
    for _ in 0..c.max_step() {
        assert_eq!(c.outcome(), Outcome::Unknown);
        c.step_forward();
    }
    assert_eq!(c.step(), 2);
    assert_eq!(c.outcome(), Outcome::Failed);
    assert!(c.current_result().unwrap().parent_match.is_none());
    let report = c.report().unwrap();
    assert!(report.has_failure());
    assert_eq!(report.error.as_deref(), Some("signature too short"));
    assert!(report.root.is_none());
}

#[test]
fn test_highlights_are_cumulative() {
    let mut c = controller_on("ok");
    c.scrub_to(i64::MAX);
    let grid = c.highlights();
    let on_path = grid.iter().flatten().filter(|h| **h == Highlight::OnPath).count();
    let siblings = grid.iter().flatten().filter(|h| **h == Highlight::Sibling).count();
    assert_eq!(on_path, 3);
    assert_eq!(siblings, 3);
    assert_eq!(c.highlight(NodeKey::new(3, 0)), Highlight::Unvisited);
}

#[test]
fn test_switching_scenario_resets_step() {
    let mut c = controller_on("ok");
    c.scrub_to(2);
    c.select_scenario("corrupted_sig").unwrap();
    assert_eq!(c.step(), 0);
    assert_eq!(c.scenario().key, "corrupted_sig");
    assert_matches!(c.select_scenario("missing"), Err(ReplayError::ScenarioNotFound(_)));
    assert_eq!(c.scenario().key, "corrupted_sig");
}

#[test]
fn test_speed_change_discards_old_timer() {
    let mut c = controller_on("ok");
    let slow = c.play(Duration::from_millis(500)).unwrap();
    let fast = c.set_speed(Duration::from_millis(50)).unwrap();
    assert_eq!(c.tick(slow.id), TickOutcome::Stale);
    assert_eq!(c.tick(fast.id), TickOutcome::Advanced(1));
    c.pause();
    assert_eq!(c.tick(fast.id), TickOutcome::Stale);
    assert_eq!(c.step(), 1);
}

#[test]
fn test_play_at_last_step_stops_on_next_tick() {
    let mut c = controller_on("ok");
    c.scrub_to(2);
    let timer = c.play(Duration::from_millis(10)).unwrap();
    assert!(c.is_playing());
    assert_eq!(c.tick(timer.id), TickOutcome::Stopped);
    assert_eq!(c.step(), 2);
    assert!(!c.is_playing());
}

#[test]
fn test_controllers_share_catalog_independently() {
    let shared = catalog();
    let mut a = PlaybackController::new(Arc::clone(&shared)).unwrap();
    let b = PlaybackController::new(Arc::clone(&shared)).unwrap();
    a.scrub_to(2);
    assert_eq!(a.step(), 2);
    assert_eq!(b.step(), 0);
}

#[test]
fn test_view_serializes() {
    let mut c = controller_on("corrupted_sig");
    c.scrub_to(2);
    let json = serde_json::to_value(c.view()).unwrap();
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["state"], "at_step");
    assert_eq!(json["result"]["parent_match"], false);
    assert_eq!(json["report"]["root"]["matched"], false);
}
