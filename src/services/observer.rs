// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observability hooks for the dispatcher.
//!
//! The dispatcher reports status hints and failures through an injected
//! [`RequestObserver`] instead of logging directly.

/// Server-provided status hint headers.
pub const STATUS_HEADER: &str = "x-digi-sdk-status";
pub const STATUS_MESSAGE_HEADER: &str = "x-digi-sdk-status-message";

/// Context describing one failed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestFailure<'a> {
    pub url: &'a str,
    /// `None` when no response was obtained
    pub status: Option<u16>,
    /// Error code from the structured envelope
    pub error_code: Option<&'a str>,
    /// Envelope message, transport cause, or best-effort body text
    pub message: Option<&'a str>,
}

/// Receives status and failure signals from the dispatcher.
pub trait RequestObserver: Send + Sync {
    /// Both status hint headers were present on a response.
    fn status_message(&self, url: &str, status: &str, message: &str);

    fn request_failed(&self, failure: &RequestFailure<'_>);
}

/// Default observer: emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn status_message(&self, url: &str, status: &str, message: &str) {
        tracing::info!(url, sdk_status = status, sdk_message = message, "API status notice");
    }

    fn request_failed(&self, failure: &RequestFailure<'_>) {
        tracing::error!(
            url = failure.url,
            status = failure.status,
            code = failure.error_code,
            message = failure.message,
            "API request failed"
        );
    }
}
