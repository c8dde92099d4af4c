// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed API routes.
//!
//! A [`Route`] describes one call: verb, path, query, body, and how to
//! decode the success payload. The dispatcher is generic over routes, so
//! adding an endpoint only means adding a route type here.

pub mod accounts;
pub mod files;
pub mod sync;

pub use accounts::ReadAccountsRoute;
pub use files::{FileListRoute, ReadFileRoute};
pub use sync::TriggerSyncRoute;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiErrorResponse, Result, SdkError};

/// Description of one API endpoint and its encode/decode rules.
///
/// Routes are immutable values created per call; decoding is pure.
pub trait Route: Send + Sync {
    /// Decoded success payload.
    type Response: Send + 'static;

    fn method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the API root, starting with `/`.
    fn path(&self) -> String;

    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Serialized request body, if the route sends one.
    fn body(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    /// Decode a non-empty success body.
    fn parse_response(&self, data: &[u8], headers: &HeaderMap) -> Result<Self::Response>;
}

/// Decode a JSON success body, mapping failures to [`SdkError::InvalidData`].
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| {
        tracing::warn!(error = %e, "Failed to decode response body");
        SdkError::InvalidData
    })
}

/// Encode a JSON request body.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Option<Vec<u8>>> {
    serde_json::to_vec(value).map(Some).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode request body");
        SdkError::InvalidData
    })
}

/// Decode the uniform error envelope. Anything else yields `None`.
pub fn decode_error_envelope(data: Option<&[u8]>) -> Option<ApiError> {
    let data = data?;
    serde_json::from_slice::<ApiErrorResponse>(data)
        .ok()
        .map(|response| response.error)
}

/// Build `/permission-access/query/{session}/{segments...}` with each
/// segment percent-encoded.
fn query_path(session_key: &str, segments: &[&str]) -> String {
    let mut path = format!(
        "/permission-access/query/{}",
        urlencoding::encode(session_key)
    );
    for segment in segments {
        path.push('/');
        path.push_str(&urlencoding::encode(segment));
    }
    path
}
