// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caller-side retry around single-shot operations.
//!
//! Operations are never restarted: each attempt builds a fresh instance.

use futures_util::FutureExt;
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;

/// Initial backoff delay.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Backoff cap.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            ..Self::default()
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): `initial * 2^retry`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// the policy is exhausted.
///
/// `attempt` receives the 0-based attempt number and yields `None` when the
/// attempt was cancelled. Cancellation of an attempt, or `cancelled`
/// resolving at any point (including during backoff), ends the loop with
/// `None`; no further attempt is created after that.
pub async fn run_with_retry<T, F, Fut, C>(
    policy: &RetryPolicy,
    cancelled: C,
    mut attempt: F,
) -> Option<Result<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<Result<T>>>,
    C: Future<Output = ()>,
{
    tokio::pin!(cancelled);
    let mut attempt_number = 0;
    loop {
        if (&mut cancelled).now_or_never().is_some() {
            tracing::debug!(attempt = attempt_number + 1, "Retry cancelled before attempt");
            return None;
        }

        let outcome = tokio::select! {
            biased;
            _ = &mut cancelled => return None,
            outcome = attempt(attempt_number) => outcome?,
        };

        match outcome {
            Err(e) if e.is_retryable() && attempt_number < policy.max_retries => {
                let delay = policy.backoff(attempt_number);
                tracing::warn!(
                    attempt = attempt_number + 1,
                    max_attempts = policy.max_retries + 1,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = &mut cancelled => {
                        tracing::debug!(attempt = attempt_number + 1, "Retry cancelled during backoff");
                        return None;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt_number += 1;
            }
            outcome => return Some(outcome),
        }
    }
}
