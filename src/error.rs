// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy shared by the dispatcher, operations and the pull pipeline.

use serde::{Deserialize, Serialize};

/// Structured error body returned by the remote API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Wire envelope around [`ApiError`]: `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Classified failure returned by every fallible call in this crate.
///
/// Cancellation has no variant: a cancelled operation never delivers a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkError {
    #[error("Request failed before a response was received: {cause}")]
    TransportFailure { cause: String },

    #[error("HTTP {status}{}", describe_api_error(.api_error))]
    HttpResponse {
        status: u16,
        api_error: Option<ApiError>,
    },

    #[error("Client protocol version is no longer accepted")]
    InvalidProtocolVersion,

    #[error("Requested scope is outside the consented contract")]
    ScopeOutOfBounds,

    #[error("Response data could not be decoded")]
    InvalidData,

    #[error("Unexpected or empty response")]
    Other,

    #[error("Statistics query failed: {0}")]
    DataSource(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),
}

impl SdkError {
    /// Rate limiting from the API.
    pub const RATE_LIMITED: u16 = 429;

    /// Map a non-2xx status and optional decoded envelope to an error kind.
    ///
    /// Only the exact `(status, code)` pairs below get their own kind;
    /// everything else stays a generic HTTP error.
    pub fn from_status(status: u16, api_error: Option<ApiError>) -> Self {
        match (status, api_error.as_ref().map(|e| e.code.as_str())) {
            (403, Some("SDKVersionInvalid")) => SdkError::InvalidProtocolVersion,
            (400, Some("ScopeOutOfBounds")) => SdkError::ScopeOutOfBounds,
            _ => SdkError::HttpResponse { status, api_error },
        }
    }

    /// Whether a caller-driven retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::TransportFailure { .. } | SdkError::DataSource(_) => true,
            SdkError::HttpResponse { status, .. } => {
                *status == Self::RATE_LIMITED || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

fn describe_api_error(api_error: &Option<ApiError>) -> String {
    api_error
        .as_ref()
        .map(|e| format!(" ({}: {})", e.code, e.message))
        .unwrap_or_default()
}

/// Result type alias for SDK calls
pub type Result<T> = std::result::Result<T, SdkError>;
