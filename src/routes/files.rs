// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session file listing and per-file retrieval.

use reqwest::header::{HeaderMap, CONTENT_TYPE};

use super::{decode_json, query_path, Route};
use crate::error::Result;
use crate::models::{FileContent, FileList};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// `GET /permission-access/query/{session}`
#[derive(Debug, Clone)]
pub struct FileListRoute {
    pub session_key: String,
}

impl Route for FileListRoute {
    type Response = FileList;

    fn path(&self) -> String {
        query_path(&self.session_key, &[])
    }

    fn parse_response(&self, data: &[u8], _headers: &HeaderMap) -> Result<FileList> {
        decode_json(data)
    }
}

/// `GET /permission-access/query/{session}/{file_id}`
///
/// The body is returned as-is; its type comes from `Content-Type`.
#[derive(Debug, Clone)]
pub struct ReadFileRoute {
    pub session_key: String,
    pub file_id: String,
}

impl Route for ReadFileRoute {
    type Response = FileContent;

    fn path(&self) -> String {
        query_path(&self.session_key, &[&self.file_id])
    }

    fn parse_response(&self, data: &[u8], headers: &HeaderMap) -> Result<FileContent> {
        let mime_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        Ok(FileContent {
            identifier: self.file_id.clone(),
            mime_type,
            data: data.to_vec(),
        })
    }
}
