// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Connected source accounts within a session.

use serde::{Deserialize, Serialize};

/// One connected data source (a service login) within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceAccount {
    /// Account identifier, unique within the session
    pub id: String,
    /// Display name reported by the service
    #[serde(default)]
    pub name: Option<String>,
    /// Service the account belongs to
    #[serde(default)]
    pub service: Option<AccountService>,
}

impl SourceAccount {
    /// Account for data read from the device itself rather than a remote service.
    pub fn local(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            service: None,
        }
    }
}

/// Service metadata attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountService {
    pub id: u64,
    pub name: String,
}

/// Response body of the account listing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsInfo {
    pub accounts: Vec<SourceAccount>,
}
