// src/playback/mod.rs

//! Playback state machine.
//!
//! A [`PlaybackController`] is one viewer's cursor over a shared
//! [`DemoCatalog`]. It owns the current scenario, the step, and at most one
//! outstanding auto-advance timer, represented by a [`TimerHandle`]. Whatever
//! drives time (the tokio [`player::Player`], a UI event loop, a test) calls
//! [`PlaybackController::tick`] with the handle's id; ticks from a cancelled
//! handle are ignored.
//!
//! Every command that moves the cursor cancels the timer first.

#[cfg(feature = "async")]
pub mod player;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::core::catalog::DemoCatalog;
use crate::core::details::{scenario_report, ScenarioReport};
use crate::core::merkle::NodeKey;
use crate::core::scenario::Scenario;
use crate::core::step::{compute_step, StepResult};
use crate::error::{ReplayError, Result as ReplayResult};
use crate::types::{Highlight, Outcome, PlaybackState};

/// The single repeating task a controller may have scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub id: u64,
    pub interval: Duration,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Moved to this step; playback continues.
    Advanced(usize),
    /// Already at the last step; playback stopped and the timer is gone.
    Stopped,
    /// The tick belongs to a timer that is no longer current.
    Stale,
}

/// Snapshot of what a presentation layer needs for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackView {
    pub scenario: String,
    pub step: usize,
    pub max_step: usize,
    pub state: PlaybackState,
    pub interactive: bool,
    pub result: Option<StepResult>,
    pub outcome: Outcome,
    /// Only present once the last step is reached.
    pub report: Option<ScenarioReport>,
}

/// One viewer's playback cursor.
#[derive(Debug)]
pub struct PlaybackController {
    catalog: Arc<DemoCatalog>,
    scenario: Arc<Scenario>,
    step: usize,
    max_step: usize,
    state: PlaybackState,
    timer: Option<TimerHandle>,
    next_timer_id: u64,
}

impl PlaybackController {
    /// Creates a controller positioned on the first scenario of the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::NotFound`] for an empty catalog.
    pub fn new(catalog: Arc<DemoCatalog>) -> ReplayResult<Self> {
        let scenario = catalog
            .first()
            .cloned()
            .ok_or_else(|| ReplayError::not_found("catalog has no scenarios"))?;
        let max_step = scenario.max_step();
        Ok(Self {
            catalog,
            scenario,
            step: 0,
            max_step,
            state: PlaybackState::AtStep,
            timer: None,
            next_timer_id: 0,
        })
    }

    /// Creates a controller positioned on `key`.
    pub fn with_scenario(catalog: Arc<DemoCatalog>, key: &str) -> ReplayResult<Self> {
        let mut controller = Self::new(catalog)?;
        controller.select_scenario(key)?;
        Ok(controller)
    }

    pub fn catalog(&self) -> &Arc<DemoCatalog> {
        &self.catalog
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn max_step(&self) -> usize {
        self.max_step
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// False for degraded scenarios; playback commands then do nothing.
    pub fn is_interactive(&self) -> bool {
        self.scenario.is_interactive()
    }

    /// The outstanding timer, if playing.
    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            log::debug!("Cancelled playback timer #{}", timer.id);
        }
        self.state = PlaybackState::AtStep;
    }

    /// Switches to another scenario and rewinds to step 0.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::ScenarioNotFound`] for an unknown key; the
    /// controller is left untouched in that case.
    pub fn select_scenario(&mut self, key: &str) -> ReplayResult<()> {
        let scenario = self
            .catalog
            .scenario(key)
            .cloned()
            .ok_or_else(|| ReplayError::scenario_not_found(key))?;
        self.cancel_timer();
        self.max_step = scenario.max_step();
        self.scenario = scenario;
        self.step = 0;
        log::debug!(
            "Selected scenario '{}' ({} steps, interactive: {})",
            key,
            self.max_step + 1,
            self.is_interactive()
        );
        Ok(())
    }

    pub fn step_forward(&mut self) -> usize {
        self.cancel_timer();
        self.advance()
    }

    pub fn step_backward(&mut self) -> usize {
        self.cancel_timer();
        self.step = self.step.saturating_sub(1);
        self.step
    }

    /// Moves to `target`, clamped into `[0, max_step]`.
    pub fn scrub_to(&mut self, target: i64) -> usize {
        self.cancel_timer();
        self.step = usize::try_from(target.max(0)).unwrap_or(usize::MAX).min(self.max_step);
        self.step
    }

    fn advance(&mut self) -> usize {
        self.step = (self.step + 1).min(self.max_step);
        self.step
    }

    /// Starts auto-advancing every `interval`.
    ///
    /// Returns the new timer, or `None` when already playing or when the
    /// scenario is not interactive.
    pub fn play(&mut self, interval: Duration) -> Option<TimerHandle> {
        if self.is_playing() || !self.is_interactive() {
            return None;
        }
        let timer = TimerHandle {
            id: self.next_timer_id,
            interval,
        };
        self.next_timer_id += 1;
        self.timer = Some(timer);
        self.state = PlaybackState::Playing;
        log::debug!("Playing '{}' from step {} every {:?}", self.scenario.key, self.step, interval);
        Some(timer)
    }

    /// Stops auto-advancing. Idempotent.
    pub fn pause(&mut self) {
        self.cancel_timer();
    }

    /// Restarts playback at a new interval, keeping the current step.
    ///
    /// Does nothing unless playing.
    pub fn set_speed(&mut self, interval: Duration) -> Option<TimerHandle> {
        if !self.is_playing() {
            return None;
        }
        self.pause();
        self.play(interval)
    }

    /// Delivers one tick of timer `timer_id`.
    pub fn tick(&mut self, timer_id: u64) -> TickOutcome {
        match self.timer {
            Some(timer) if timer.id == timer_id && self.is_playing() => {}
            _ => return TickOutcome::Stale,
        }
        if self.step >= self.max_step {
            self.cancel_timer();
            log::debug!("Playback of '{}' reached step {}", self.scenario.key, self.step);
            return TickOutcome::Stopped;
        }
        TickOutcome::Advanced(self.advance())
    }

    /// The step result at the cursor.
    pub fn current_result(&self) -> Option<StepResult> {
        compute_step(&self.scenario, self.step)
    }

    /// Highlight of one node at the current step.
    pub fn highlight(&self, key: NodeKey) -> Highlight {
        let Some(replay) = self.scenario.replay.as_ref() else {
            return Highlight::Unvisited;
        };
        let upto = (self.step + 1).min(replay.path.len());
        if replay.path[..upto].iter().any(|p| p.key() == key) {
            Highlight::OnPath
        } else if replay.auth_path[..upto].iter().any(|a| a.key() == key) {
            Highlight::Sibling
        } else {
            Highlight::Unvisited
        }
    }

    /// Highlights for every node, indexed `[level][index]`.
    pub fn highlights(&self) -> Vec<Vec<Highlight>> {
        let Some(replay) = self.scenario.replay.as_ref() else {
            return Vec::new();
        };
        let mut out: Vec<Vec<Highlight>> = (0..replay.tree.level_count() as u32)
            .map(|level| vec![Highlight::Unvisited; replay.tree.level(level).map_or(0, <[_]>::len)])
            .collect();
        let upto = (self.step + 1).min(replay.path.len());
        let mut mark = |key: NodeKey, h: Highlight| {
            if let Some(cell) = out
                .get_mut(key.level as usize)
                .and_then(|row| row.get_mut(key.index as usize))
            {
                *cell = h;
            }
        };
        for sib in &replay.auth_path[..upto] {
            mark(sib.key(), Highlight::Sibling);
        }
        for cur in &replay.path[..upto] {
            mark(cur.key(), Highlight::OnPath);
        }
        out
    }

    /// The root node address, `(h, 0)`.
    pub fn root_key(&self) -> Option<NodeKey> {
        let levels = self.scenario.level_count()?;
        Some(NodeKey::new(levels.saturating_sub(1) as u32, 0))
    }

    /// `Unknown` until the last step, then the recorded root verdict.
    ///
    /// A replayable scenario without a recorded root comparison never
    /// reached the root, so it ends as `Failed`.
    pub fn outcome(&self) -> Outcome {
        if self.step < self.max_step {
            return Outcome::Unknown;
        }
        let recorded = self.scenario.outcome.root_match;
        if self.is_interactive() {
            Outcome::from_root_match(Some(recorded.unwrap_or(false)))
        } else {
            Outcome::from_root_match(recorded)
        }
    }

    /// The end-of-replay report, available once the last step is reached.
    pub fn report(&self) -> Option<ScenarioReport> {
        (self.step >= self.max_step).then(|| scenario_report(&self.scenario))
    }

    pub fn view(&self) -> PlaybackView {
        PlaybackView {
            scenario: self.scenario.key.clone(),
            step: self.step,
            max_step: self.max_step,
            state: self.state,
            interactive: self.is_interactive(),
            result: self.current_result(),
            outcome: self.outcome(),
            report: self.report(),
        }
    }
}
