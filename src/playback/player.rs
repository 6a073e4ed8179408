// src/playback/player.rs

//! Tokio driver for a [`PlaybackController`].
//!
//! The controller itself never sleeps. A `Player` owns the one background
//! task that turns a [`TimerHandle`] into real ticks, and aborts it whenever
//! a command replaces or cancels the timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{PlaybackController, PlaybackView, TickOutcome, TimerHandle};
use crate::error::{ReplayError, Result as ReplayResult};

/// Async wrapper that runs auto-advance on the tokio runtime.
pub struct Player {
    controller: Arc<Mutex<PlaybackController>>,
    steps: Arc<watch::Sender<usize>>,
    task: Option<JoinHandle<()>>,
}

impl Player {
    pub fn new(controller: PlaybackController) -> Self {
        let (steps, _) = watch::channel(controller.step());
        Self {
            controller: Arc::new(Mutex::new(controller)),
            steps: Arc::new(steps),
            task: None,
        }
    }

    /// Shared handle to the underlying controller.
    pub fn controller(&self) -> Arc<Mutex<PlaybackController>> {
        Arc::clone(&self.controller)
    }

    /// Receives the step after every change, including background ticks.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.steps.subscribe()
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn publish(&self, step: usize) {
        self.steps.send_replace(step);
    }

    /// Starts auto-advance. See [`PlaybackController::play`].
    pub async fn play(&mut self, interval: Duration) -> Option<TimerHandle> {
        let timer = self.controller.lock().await.play(interval)?;
        self.abort_task();
        self.task = Some(self.spawn_ticker(timer));
        Some(timer)
    }

    fn spawn_ticker(&self, timer: TimerHandle) -> JoinHandle<()> {
        let controller = Arc::clone(&self.controller);
        let steps = Arc::clone(&self.steps);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(timer.interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let outcome = controller.lock().await.tick(timer.id);
                match outcome {
                    TickOutcome::Advanced(step) => {
                        log::trace!("Timer #{} advanced to step {}", timer.id, step);
                        steps.send_replace(step);
                    }
                    TickOutcome::Stopped | TickOutcome::Stale => break,
                }
            }
        })
    }

    pub async fn pause(&mut self) {
        self.abort_task();
        self.controller.lock().await.pause();
    }

    /// Restarts the ticker at `interval` if currently playing.
    pub async fn set_speed(&mut self, interval: Duration) -> Option<TimerHandle> {
        let timer = self.controller.lock().await.set_speed(interval);
        if let Some(timer) = timer {
            self.abort_task();
            self.task = Some(self.spawn_ticker(timer));
        }
        timer
    }

    pub async fn step_forward(&mut self) -> usize {
        self.abort_task();
        let step = self.controller.lock().await.step_forward();
        self.publish(step);
        step
    }

    pub async fn step_backward(&mut self) -> usize {
        self.abort_task();
        let step = self.controller.lock().await.step_backward();
        self.publish(step);
        step
    }

    pub async fn scrub_to(&mut self, target: i64) -> usize {
        self.abort_task();
        let step = self.controller.lock().await.scrub_to(target);
        self.publish(step);
        step
    }

    /// Switches scenario and rewinds, stopping any running ticker.
    ///
    /// An unknown key leaves playback untouched, ticker included.
    pub async fn select_scenario(&mut self, key: &str) -> ReplayResult<()> {
        let shared = Arc::clone(&self.controller);
        let mut controller = shared.lock().await;
        if controller.catalog().scenario(key).is_none() {
            return Err(ReplayError::scenario_not_found(key));
        }
        self.abort_task();
        controller.select_scenario(key)?;
        self.publish(controller.step());
        Ok(())
    }

    pub async fn view(&self) -> PlaybackView {
        self.controller.lock().await.view()
    }

    /// Waits for the running ticker, if any, to reach the last step.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Playback`](crate::error::ReplayError::Playback)
    /// if the ticker panicked.
    pub async fn wait_until_stopped(&mut self) -> ReplayResult<()> {
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.abort_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::DemoCatalog;
    use crate::test_utils::fixture_document;
    use crate::types::PlaybackState;

    fn player() -> Player {
        let catalog = Arc::new(DemoCatalog::load(fixture_document()).unwrap());
        Player::new(PlaybackController::new(catalog).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_runs_to_the_end_and_stops() {
        let mut player = player();
        let mut steps = player.subscribe();
        assert!(player.play(Duration::from_millis(100)).await.is_some());
        player.wait_until_stopped().await.unwrap();

        let view = player.view().await;
        assert_eq!(view.step, view.max_step);
        assert_eq!(view.state, PlaybackState::AtStep);
        assert_eq!(*steps.borrow_and_update(), view.max_step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_the_ticker() {
        let mut player = player();
        player.play(Duration::from_millis(100)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        player.pause().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = player.view().await;
        assert_eq!(view.step, 1);
        assert_eq!(view.state, PlaybackState::AtStep);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_play_keeps_single_ticker() {
        let mut player = player();
        let first = player.play(Duration::from_millis(100)).await.unwrap();
        assert!(player.play(Duration::from_millis(100)).await.is_none());
        tokio::time::sleep(Duration::from_millis(150)).await;
        let controller = player.controller();
        let guard = controller.lock().await;
        assert_eq!(guard.step(), 1);
        assert_eq!(guard.timer().map(|t| t.id), Some(first.id));
    }
}
