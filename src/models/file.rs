// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session file listing and file content.

use serde::{Deserialize, Serialize};

/// State of the server-side sync that produces session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Pending,
    Running,
    Partial,
    Completed,
}

impl SyncState {
    /// Whether more files may still appear in the listing.
    pub fn is_in_progress(self) -> bool {
        matches!(self, SyncState::Pending | SyncState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// One retrievable file in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListItem {
    pub name: String,
    #[serde(default)]
    pub updated_date: Option<i64>,
}

/// Response body of the file list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    pub status: SyncStatus,
    #[serde(default)]
    pub file_list: Vec<FileListItem>,
}

/// Response body of the sync trigger call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTriggered {
    pub status: SyncState,
}

/// Raw content of one session file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContent {
    pub identifier: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FileContent {
    /// Parse the content as JSON, if it is JSON.
    pub fn as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.data).ok()
    }
}
