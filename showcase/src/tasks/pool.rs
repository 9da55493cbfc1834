//! Fixed-size worker pool on OS threads
//!
//! At most `size` tasks run at once; further submissions wait in a FIFO
//! queue until a worker is free. Tasks receive an `Interrupt` handle so that
//! blocking waits can be cut short by `shutdown_now`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::{debug, trace, warn};

use super::{Interrupted, PoolError, TaskState, lock};

type Job = Box<dyn FnOnce(&Interrupt) -> Result<(), Interrupted> + Send + 'static>;

/// Counter used to give each pool a distinct thread-name prefix
static POOL_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Shared interrupt flag with an interruptible sleep
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every sleeper
    pub fn interrupt(&self) {
        let (flag, cvar) = &*self.inner;
        *lock(flag) = true;
        cvar.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *lock(&self.inner.0)
    }

    /// Block for `duration` unless interrupted first
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + duration;
        let mut interrupted = lock(flag);
        loop {
            if *interrupted {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            interrupted = cvar
                .wait_timeout(interrupted, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }
}

/// Bookkeeping shared between the pool handle and its workers
struct PoolShared {
    states: Mutex<Vec<TaskState>>,
    /// Tasks submitted but not yet terminal
    outstanding: Mutex<usize>,
    drained: Condvar,
    interrupt: Interrupt,
    /// First panic raised by a job, resumed on the owner when the pool drops
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

impl PoolShared {
    fn set_state(&self, id: usize, state: TaskState) {
        if let Some(slot) = lock(&self.states).get_mut(id) {
            *slot = state;
        }
    }

    fn finish(&self, id: usize, state: TaskState) {
        self.set_state(id, state);
        match state {
            TaskState::Completed => counter!("showcase_tasks_completed_total").increment(1),
            _ => counter!("showcase_tasks_interrupted_total").increment(1),
        }
        let mut outstanding = lock(&self.outstanding);
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }
}

/// Bounded pool of persistent worker threads
pub struct FixedPool {
    sender: Option<Sender<(usize, Job)>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<PoolShared>,
}

impl FixedPool {
    /// Start `size` workers
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::EmptyPool);
        }

        let pool_id = POOL_COUNTER.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel::<(usize, Job)>();
        let receiver = Arc::new(Mutex::new(receiver));
        let shared = Arc::new(PoolShared {
            states: Mutex::new(Vec::new()),
            outstanding: Mutex::new(0),
            drained: Condvar::new(),
            interrupt: Interrupt::new(),
            panic: Mutex::new(None),
        });

        let mut workers = Vec::with_capacity(size);
        for worker_idx in 1..=size {
            let receiver = Arc::clone(&receiver);
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("pool-{}-thread-{}", pool_id, worker_idx))
                .spawn(move || worker_loop(receiver, shared))?;
            workers.push(handle);
        }

        debug!("Started fixed pool {} with {} workers", pool_id, size);
        Ok(Self {
            sender: Some(sender),
            workers,
            shared,
        })
    }

    /// Queue a task; returns its ordinal
    pub fn submit<F>(&self, job: F) -> Result<usize, PoolError>
    where
        F: FnOnce(&Interrupt) -> Result<(), Interrupted> + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::Rejected)?;

        let id = {
            let mut states = lock(&self.shared.states);
            states.push(TaskState::Submitted);
            states.len() - 1
        };
        *lock(&self.shared.outstanding) += 1;

        if sender.send((id, Box::new(job))).is_err() {
            // All workers are gone; the task never runs
            self.shared.finish(id, TaskState::Interrupted);
            return Err(PoolError::Rejected);
        }
        Ok(id)
    }

    /// Stop accepting tasks; queued tasks still run
    pub fn shutdown(&mut self) {
        self.sender.take();
    }

    /// Stop accepting tasks, interrupt running ones and drop queued ones
    pub fn shutdown_now(&mut self) {
        self.sender.take();
        self.shared.interrupt.interrupt();
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.is_none()
    }

    /// Wait until every submitted task is terminal; false on timeout
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut outstanding = lock(&self.shared.outstanding);
        while *outstanding > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            outstanding = self
                .shared
                .drained
                .wait_timeout(outstanding, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
        true
    }

    /// Like `await_termination`, but a timeout is an error
    pub fn await_drained(&self, timeout: Duration) -> Result<(), PoolError> {
        if self.await_termination(timeout) {
            Ok(())
        } else {
            Err(PoolError::StillBusy(timeout))
        }
    }

    /// Snapshot of every task's state, indexed by ordinal
    pub fn states(&self) -> Vec<TaskState> {
        lock(&self.shared.states).clone()
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        let payload = lock(&self.shared.panic).take();
        if let Some(payload) = payload
            && !thread::panicking()
        {
            panic::resume_unwind(payload);
        }
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<(usize, Job)>>>, shared: Arc<PoolShared>) {
    loop {
        // Hold the receiver lock only while taking the next job
        let next = lock(&receiver).recv();
        let Ok((id, job)) = next else {
            break;
        };

        if shared.interrupt.is_interrupted() {
            trace!("Dropping queued task {} after interrupt", id);
            shared.finish(id, TaskState::Interrupted);
            continue;
        }

        shared.set_state(id, TaskState::Running);
        let state = match panic::catch_unwind(AssertUnwindSafe(|| job(&shared.interrupt))) {
            Ok(Ok(())) => TaskState::Completed,
            Ok(Err(Interrupted)) => TaskState::Interrupted,
            Err(payload) => {
                warn!("Task {} panicked", id);
                lock(&shared.panic).get_or_insert(payload);
                TaskState::Interrupted
            }
        };
        shared.finish(id, state);
    }
    trace!(
        "Worker {} exiting",
        thread::current().name().unwrap_or("unnamed")
    );
}
