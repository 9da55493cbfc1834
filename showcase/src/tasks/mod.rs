//! Task execution primitives
//!
//! This module provides:
//! - `FixedPool` for bounded execution on persistent OS worker threads
//! - `LightweightExecutor` for task-per-unit execution over a few carriers
//! - `TaskGroup` for structured fork/join with shutdown-on-failure
//! - `TaskTally` for counting outcomes and timing tasks

pub mod lightweight;
pub mod pool;
pub mod structured;

pub use lightweight::LightweightExecutor;
pub use pool::{FixedPool, Interrupt};
pub use structured::{CancelToken, GroupError, GroupPhase, Subtask, SubtaskState, TaskGroup};

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

/// Lifecycle of a submitted task unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Submitted,
    Running,
    Completed,
    Interrupted,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Interrupted)
    }
}

/// A blocking wait was cut short by an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task was interrupted")]
pub struct Interrupted;

/// Errors raised by task executors
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Executor is shut down; task rejected")]
    Rejected,

    #[error("Pool size must be at least 1")]
    EmptyPool,

    #[error("Executor still busy after {0:?}")]
    StillBusy(Duration),

    #[error("Failed to start worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Lock a std mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome counts and per-task durations for one executor run
#[derive(Debug, Default, Clone)]
pub struct TaskTally {
    pub completed: usize,
    pub interrupted: usize,
    pub samples: Vec<Duration>,
}

impl TaskTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tally from final task states
    pub fn from_states(states: &[TaskState]) -> Self {
        let mut tally = Self::new();
        for state in states {
            match state {
                TaskState::Completed => tally.completed += 1,
                TaskState::Interrupted => tally.interrupted += 1,
                _ => {}
            }
        }
        tally
    }

    pub fn record(&mut self, duration: Duration) {
        self.samples.push(duration);
    }

    pub fn total(&self) -> usize {
        self.completed + self.interrupted
    }

    /// Calculate percentile (0-100)
    fn percentile(&self, p: f64) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted = self.samples.clone();
        sorted.sort();

        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_from_states() {
        let states = [
            TaskState::Completed,
            TaskState::Interrupted,
            TaskState::Completed,
            TaskState::Running,
        ];
        let tally = TaskTally::from_states(&states);
        assert_eq!(tally.completed, 2);
        assert_eq!(tally.interrupted, 1);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_tally_percentiles() {
        let mut tally = TaskTally::new();
        assert!(tally.p99().is_none());

        for ms in 1..=100 {
            tally.record(Duration::from_millis(ms));
        }
        assert_eq!(tally.p99(), Some(Duration::from_millis(99)));
        assert_eq!(tally.p50(), Some(Duration::from_millis(51)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Interrupted.is_terminal());
        assert!(!TaskState::Submitted.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }
}
