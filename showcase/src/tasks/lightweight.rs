//! Task-per-unit executor over a small set of carrier threads
//!
//! Every submitted unit becomes its own tokio task. Awaiting a timer or other
//! blocking point suspends the task and frees its carrier, so far more units
//! than carriers can be in flight at once.
//!
//! The executor owns its runtime, so it must be created, used and closed
//! from a blocking context (a plain thread or `spawn_blocking`), never from
//! inside another async task.

use std::future::Future;
use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{PoolError, TaskState, lock};

/// Executor that runs one lightweight task per submitted unit
pub struct LightweightExecutor {
    runtime: Runtime,
    handles: Vec<(usize, JoinHandle<()>)>,
    states: Arc<Mutex<Vec<TaskState>>>,
}

impl LightweightExecutor {
    /// Build an executor backed by `carriers` OS threads
    pub fn new(carriers: usize) -> Result<Self, PoolError> {
        if carriers == 0 {
            return Err(PoolError::EmptyPool);
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(carriers)
            .thread_name("carrier")
            .enable_time()
            .build()?;

        debug!("Started lightweight executor on {} carriers", carriers);
        Ok(Self {
            runtime,
            handles: Vec::new(),
            states: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Start a unit immediately; returns its ordinal
    pub fn submit<F, Fut>(&mut self, job: F) -> usize
    where
        F: FnOnce(usize) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = {
            let mut states = lock(&self.states);
            states.push(TaskState::Submitted);
            states.len() - 1
        };

        let states = Arc::clone(&self.states);
        // Timers created eagerly by `job` need the runtime context
        let _enter = self.runtime.enter();
        let body = job(id);
        let handle = self.runtime.spawn(async move {
            set_state(&states, id, TaskState::Running);
            body.await;
            set_state(&states, id, TaskState::Completed);
        });
        self.handles.push((id, handle));
        id
    }

    /// Abort every unit that has not finished yet
    pub fn cancel_all(&self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }

    /// Snapshot of every unit's state, indexed by ordinal
    pub fn states(&self) -> Vec<TaskState> {
        lock(&self.states).clone()
    }

    /// Wait for every unit to finish and shut the carriers down
    pub fn close(mut self) -> Vec<TaskState> {
        let handles = std::mem::take(&mut self.handles);
        let states = Arc::clone(&self.states);

        self.runtime.block_on(async move {
            for (id, handle) in handles {
                match handle.await {
                    Ok(()) => {}
                    Err(e) if e.is_cancelled() => {
                        set_state(&states, id, TaskState::Interrupted);
                    }
                    Err(e) => {
                        // A panicking unit is not an interruption
                        warn!("Lightweight task {} panicked", id);
                        std::panic::resume_unwind(e.into_panic());
                    }
                }
            }
        });

        let states = self.states();
        for state in &states {
            match state {
                TaskState::Completed => counter!("showcase_tasks_completed_total").increment(1),
                TaskState::Interrupted => {
                    counter!("showcase_tasks_interrupted_total").increment(1)
                }
                _ => {}
            }
        }
        states
    }
}

fn set_state(states: &Mutex<Vec<TaskState>>, id: usize, state: TaskState) {
    if let Some(slot) = lock(states).get_mut(id) {
        *slot = state;
    }
}
