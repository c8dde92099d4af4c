// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Authorization session scoping one pull run.

use chrono::{DateTime, Utc};

/// Opaque session obtained from the authorization collaborator.
///
/// Owned by the pull run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session key sent on every data request
    pub key: String,
    /// When the session stops being accepted, if known
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sessions without expiry metadata never expire locally.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
