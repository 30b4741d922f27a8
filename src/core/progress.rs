// ─── Progress Reporter ───
// One writer (the launch driver), many readers. Every update is published
// immediately and in call order to every live subscriber. Each subscriber owns
// an unbounded queue, so a slow reader delays only itself and loses nothing.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::launch::DriverState;

/// Status text plus `current / max` units of the operation in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub current_step: String,
    pub current: u64,
    pub max: u64,
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.current_step, self.current, self.max)
    }
}

/// Everything an observer of a launch attempt gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Busy(bool),
    State(DriverState),
    Progress(ProgressState),
    /// User-facing description of a failed attempt.
    Error(String),
}

/// Callbacks handed to the install primitive.
pub trait InstallProgress: Send + Sync {
    fn set_status(&self, status: &str);
    fn set_progress(&self, current: u64);
    fn set_max(&self, max: u64);
}

pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<LaunchEvent>>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Events published from now on. The stream ends once the reporter is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LaunchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        relock(&self.subscribers).push(tx);
        rx
    }

    /// Last published progress.
    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    pub fn reset(&self) {
        *self.lock() = ProgressState::default();
    }

    pub fn busy(&self, busy: bool) {
        self.publish(LaunchEvent::Busy(busy));
    }

    pub fn state(&self, state: DriverState) {
        self.publish(LaunchEvent::State(state));
    }

    pub fn error(&self, message: String) {
        self.publish(LaunchEvent::Error(message));
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressState)) {
        let mut state = self.lock();
        apply(&mut state);
        // Published under the lock so concurrent updates cannot reorder.
        self.publish(LaunchEvent::Progress(state.clone()));
    }

    /// Lock order is `state` then `subscribers`.
    fn publish(&self, event: LaunchEvent) {
        relock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        relock(&self.state)
    }
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InstallProgress for ProgressReporter {
    fn set_status(&self, status: &str) {
        self.update(|s| s.current_step = status.to_string());
    }

    fn set_progress(&self, current: u64) {
        self.update(|s| s.current = current);
    }

    fn set_max(&self, max: u64) {
        self.update(|s| s.max = max);
    }
}
