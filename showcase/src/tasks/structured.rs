//! Structured task groups with a shutdown-on-failure policy
//!
//! A `TaskGroup` owns every child it forks. `join` waits until each child is
//! terminal. The first child failure is kept, a shared `CancelToken` is
//! raised, and running siblings stop at their next await point. The failure
//! is only surfaced to the owner through `throw_if_failed`.
//!
//! `TaskGroup::scope` closes the group on every exit path of its body, and
//! closing does not return until no child is running.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::lock;

/// Error type returned by child tasks
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared failure kept by the group
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Body of a scoped group
pub type GroupBody<'g, R> = Pin<Box<dyn Future<Output = R> + Send + 'g>>;

/// Errors surfaced by a task group to its owner
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Child task {index} failed: {source}")]
    ChildTaskFailure {
        index: usize,
        #[source]
        source: SharedError,
    },

    #[error("Task group is closed")]
    Closed,
}

impl GroupError {
    /// The original failure raised by the child
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            GroupError::ChildTaskFailure { source, .. } => Some(source.as_ref()),
            GroupError::Closed => None,
        }
    }
}

/// A child observed cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task was cancelled")]
pub struct Cancelled;

/// Cooperative cancellation signal shared by a group's children
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless cancelled first
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(Cancelled),
        }
    }
}

/// Lifecycle of a task group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPhase {
    Open,
    Joining,
    AllCompleted,
    Failed,
    Closed,
}

/// Lifecycle of a forked child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl SubtaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubtaskState::Running)
    }
}

struct Slot<T> {
    state: SubtaskState,
    value: Option<T>,
}

/// Handle to a forked child; read it after `join`
pub struct Subtask<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Subtask<T> {
    pub fn state(&self) -> SubtaskState {
        lock(&self.slot).state
    }
}

impl<T: Clone> Subtask<T> {
    /// The child's result, present only if it succeeded
    pub fn get(&self) -> Option<T> {
        lock(&self.slot).value.clone()
    }
}

/// Marks a child cancelled if it is dropped before reaching a terminal state
struct SlotGuard<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> SlotGuard<T> {
    fn finish(&self, state: SubtaskState, value: Option<T>) {
        let mut slot = lock(&self.slot);
        slot.state = state;
        slot.value = value;
    }
}

impl<T> Drop for SlotGuard<T> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.state == SubtaskState::Running {
            slot.state = SubtaskState::Cancelled;
        }
    }
}

/// First recorded child failure
type FailureSlot = Mutex<Option<(usize, SharedError)>>;

/// Group of concurrently forked children with shutdown-on-failure
pub struct TaskGroup {
    tasks: JoinSet<()>,
    cancel: CancelToken,
    failure: Arc<FailureSlot>,
    next_index: usize,
    phase: GroupPhase,
}

impl TaskGroup {
    /// Open a group that cancels all children on the first failure
    pub fn shutdown_on_failure() -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: CancelToken::new(),
            failure: Arc::new(Mutex::new(None)),
            next_index: 0,
            phase: GroupPhase::Open,
        }
    }

    /// Run `body` with a fresh group and close the group before returning
    ///
    /// The close guarantee covers `Ok` and `Err` exits of `body`. If `body`
    /// panics or this future is dropped, the children are aborted without
    /// being awaited.
    pub async fn scope<R, F>(body: F) -> R
    where
        F: for<'g> FnOnce(&'g mut TaskGroup) -> GroupBody<'g, R>,
    {
        let mut group = TaskGroup::shutdown_on_failure();
        let result = body(&mut group).await;
        group.close().await;
        result
    }

    pub fn phase(&self) -> GroupPhase {
        self.phase
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fork a child; it receives the group's cancellation token
    pub fn fork<T, F, Fut>(&mut self, child: F) -> Result<Subtask<T>, GroupError>
    where
        T: Send + 'static,
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        if self.phase == GroupPhase::Closed {
            return Err(GroupError::Closed);
        }

        let index = self.next_index;
        self.next_index += 1;
        let slot = Arc::new(Mutex::new(Slot {
            state: SubtaskState::Running,
            value: None,
        }));
        let subtask = Subtask {
            slot: Arc::clone(&slot),
        };

        if self.cancel.is_cancelled() {
            // Forked after shutdown: never started
            lock(&slot).state = SubtaskState::Cancelled;
            return Ok(subtask);
        }

        let cancel = self.cancel.clone();
        let failure = Arc::clone(&self.failure);
        let body = child(cancel.clone());
        // Created outside the task so an abort before the first poll still marks it
        let guard = SlotGuard { slot };
        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                result = body => Some(result),
                _ = cancel.cancelled() => None,
            };

            match outcome {
                Some(Ok(value)) => guard.finish(SubtaskState::Succeeded, Some(value)),
                Some(Err(e)) if e.downcast_ref::<Cancelled>().is_some() => {
                    guard.finish(SubtaskState::Cancelled, None);
                }
                Some(Err(e)) => {
                    record_failure(&failure, index, e);
                    cancel.cancel();
                    guard.finish(SubtaskState::Failed, None);
                }
                None => guard.finish(SubtaskState::Cancelled, None),
            }
        });

        debug!("Forked child {}", index);
        Ok(subtask)
    }

    /// Wait until every forked child is terminal
    pub async fn join(&mut self) -> Result<(), GroupError> {
        if self.phase == GroupPhase::Closed {
            return Err(GroupError::Closed);
        }
        self.phase = GroupPhase::Joining;
        self.drain().await;
        self.phase = if lock(&self.failure).is_some() {
            GroupPhase::Failed
        } else {
            GroupPhase::AllCompleted
        };
        Ok(())
    }

    /// Surface the first child failure, if any
    pub fn throw_if_failed(&self) -> Result<(), GroupError> {
        match lock(&self.failure).as_ref() {
            Some((index, source)) => Err(GroupError::ChildTaskFailure {
                index: *index,
                source: Arc::clone(source),
            }),
            None => Ok(()),
        }
    }

    /// Cancel remaining children and wait until none is running
    pub async fn close(&mut self) {
        if self.phase == GroupPhase::Closed {
            return;
        }
        if !self.tasks.is_empty() {
            info!("Closing task group with {} unjoined children", self.tasks.len());
            self.cancel.cancel();
            self.tasks.abort_all();
        }
        self.drain().await;
        self.phase = GroupPhase::Closed;
    }

    async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined
                && e.is_panic()
            {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }
}

fn record_failure(failure: &FailureSlot, index: usize, error: BoxError) {
    let mut first = lock(failure);
    if first.is_none() {
        counter!("showcase_group_failures_total").increment(1);
        debug!("Child {} failed first: {}", index, error);
        *first = Some((index, Arc::from(error)));
    }
}
