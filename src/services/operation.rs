// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cancellable single-shot operations.
//!
//! [`RetryableOperation`] is the lifecycle core shared by every background
//! unit of work:
//!
//! ```text
//! Ready ──start──▶ Running ──finish──▶ Finished
//!   │                 │
//!   └────cancel───────┴──────────────▶ Cancelled
//! ```
//!
//! Both terminal states are final; a new instance is needed to run again.
//! The completion handler is taken out of the state under the same lock
//! that performs the terminal transition, so a cancel racing a completion
//! either wins (handler dropped, value discarded) or loses (handler fires,
//! cancel is a no-op). It never fires twice.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{oneshot, Notify};

use crate::error::Result;

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Ready,
    Running,
    Finished,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Finished | OperationState::Cancelled)
    }
}

/// Completion handler, invoked at most once.
pub type Completion<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

struct Inner<T> {
    state: OperationState,
    completion: Option<Completion<T>>,
}

/// State machine and completion slot for one operation.
pub struct RetryableOperation<T> {
    inner: Mutex<Inner<T>>,
    cancelled: Notify,
}

impl<T: Send + 'static> Default for RetryableOperation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> RetryableOperation<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: OperationState::Ready,
                completion: None,
            }),
            cancelled: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Critical sections never panic, but don't propagate poison if one did
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> OperationState {
        self.lock().state
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == OperationState::Cancelled
    }

    /// Install the completion handler. Ignored once the operation has left `Ready`.
    pub fn set_completion<F>(&self, completion: F) -> bool
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let mut inner = self.lock();
        if inner.state != OperationState::Ready {
            return false;
        }
        inner.completion = Some(Box::new(completion));
        true
    }

    /// Route the result into a oneshot channel instead of a callback.
    ///
    /// The receiver errors (sender dropped) when the operation is cancelled.
    pub fn completion_channel(&self) -> oneshot::Receiver<Result<T>> {
        let (tx, rx) = oneshot::channel();
        self.set_completion(move |result| {
            let _ = tx.send(result);
        });
        rx
    }

    /// `Ready -> Running`. Returns `false` if the operation must not run.
    pub fn start(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            OperationState::Ready => {
                inner.state = OperationState::Running;
                true
            }
            _ => false,
        }
    }

    /// Cancel from `Ready` or `Running`. No-op in a terminal state.
    ///
    /// Returns whether this call performed the transition.
    pub fn cancel(&self) -> bool {
        let dropped = {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return false;
            }
            inner.state = OperationState::Cancelled;
            inner.completion.take()
        };
        // Dropped outside the lock: the handler may own arbitrary state
        drop(dropped);
        self.cancelled.notify_waiters();
        true
    }

    /// `Running -> Finished`, delivering `result` to the handler if present.
    ///
    /// Returns `false` (and discards `result`) unless the operation is
    /// running: never started, cancelled, or already finished.
    pub fn finish_with(&self, result: Result<T>) -> bool {
        let completion = {
            let mut inner = self.lock();
            if inner.state != OperationState::Running {
                return false;
            }
            inner.state = OperationState::Finished;
            inner.completion.take()
        };

        if let Some(completion) = completion {
            completion(result);
        }
        true
    }

    /// Wait until the operation is cancelled. Returns immediately if it already was.
    pub async fn cancelled(&self) {
        let notified = self.cancelled.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// A unit of work the [`OperationQueue`](crate::services::OperationQueue) can run.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Execute the operation body. Implementations check cancellation
    /// before doing visible work and end in a terminal state.
    async fn run(&self);

    fn cancel(&self);

    fn state(&self) -> OperationState;
}

/// Caller-side view of a submitted operation: await its value or cancel it.
pub struct OperationHandle<T> {
    operation: Arc<dyn Operation>,
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> OperationHandle<T> {
    pub fn new(operation: Arc<dyn Operation>, receiver: oneshot::Receiver<Result<T>>) -> Self {
        Self {
            operation,
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.operation.cancel();
    }

    pub fn state(&self) -> OperationState {
        self.operation.state()
    }

    /// Wait for the result. `None` means the operation was cancelled.
    pub async fn wait(self) -> Option<Result<T>> {
        self.receiver.await.ok()
    }
}
