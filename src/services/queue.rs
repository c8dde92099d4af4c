// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded concurrent runner for [`Operation`]s.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

use crate::services::operation::Operation;

/// Default number of operations allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_OPERATIONS: usize = 4;

/// Runs operations on the tokio runtime, at most `max_concurrent` at a time.
///
/// Operations waiting for a slot are still tracked, so `cancel_all` reaches
/// them before they start. Callers that submit operations in several steps
/// (retry loops) observe `cancel_all` through [`OperationQueue::generation`]
/// and [`OperationQueue::cancelled_since`].
#[derive(Clone)]
pub struct OperationQueue {
    permits: Arc<Semaphore>,
    in_flight: Arc<DashMap<u64, Arc<dyn Operation>>>,
    next_id: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
    cancel_signal: Arc<Notify>,
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_OPERATIONS)
    }
}

impl OperationQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            generation: Arc::new(AtomicU64::new(0)),
            cancel_signal: Arc::new(Notify::new()),
        }
    }

    /// Submit an operation. The returned handle resolves once it has run
    /// (or been skipped because it was cancelled first).
    pub fn add(&self, operation: Arc<dyn Operation>) -> JoinHandle<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.in_flight.insert(id, operation.clone());

        let permits = self.permits.clone();
        let in_flight = self.in_flight.clone();
        tokio::spawn(async move {
            match permits.acquire_owned().await {
                Ok(_permit) => operation.run().await,
                Err(_) => {
                    tracing::warn!(operation_id = id, "Operation queue closed, cancelling");
                    operation.cancel();
                }
            }
            in_flight.remove(&id);
        })
    }

    /// Operations submitted and not yet done.
    pub fn operation_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of `cancel_all` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Resolve once `cancel_all` has been called after `generation` was read.
    pub async fn cancelled_since(&self, generation: u64) {
        let notified = self.cancel_signal.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.generation() != generation {
            return;
        }
        notified.await;
    }

    /// Cancel every queued and running operation.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_signal.notify_waiters();

        let operations: Vec<Arc<dyn Operation>> = self
            .in_flight
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        tracing::info!(count = operations.len(), "Cancelling all operations");
        for operation in operations {
            operation.cancel();
        }
    }
}
