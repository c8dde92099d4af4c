// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization collaborator boundary.
//!
//! The consent handshake itself happens elsewhere; the pull engine only
//! needs something that hands it a [`Session`].

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Result, SdkError};
use crate::models::Session;

/// Produces the session a pull run is scoped to.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<Session>;
}

/// Authorizer backed by a session key obtained out of band
/// (`PULL_SESSION_KEY`).
#[derive(Debug, Clone)]
pub struct EnvAuthorizer {
    session_key: Option<String>,
}

impl EnvAuthorizer {
    pub fn new(session_key: Option<String>) -> Self {
        Self { session_key }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_key.clone())
    }
}

#[async_trait]
impl Authorizer for EnvAuthorizer {
    async fn authorize(&self) -> Result<Session> {
        self.session_key
            .as_deref()
            .map(Session::new)
            .ok_or_else(|| SdkError::Authorization("no session key configured".to_string()))
    }
}
