// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request dispatcher for the consent API.
//!
//! Handles:
//! - Building transport requests from typed routes
//! - Classifying every outcome into an [`SdkError`] kind
//! - Reporting status hints and failures to the injected observer
//!
//! No retries happen here; callers decide whether to retry.

use reqwest::header::HeaderMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Result, SdkError};
use crate::routes::{decode_error_envelope, Route};
use crate::services::observer::{
    RequestFailure, RequestObserver, TracingObserver, STATUS_HEADER, STATUS_MESSAGE_HEADER,
};
use crate::services::transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};

/// Dispatches typed routes over a shared transport.
///
/// Holds no per-call state, so one client can serve any number of
/// concurrent calls and repeated calls with identical responses yield
/// identical results.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn RequestObserver>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            observer,
        }
    }

    /// Production client: reqwest transport with tracing output.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::new(
            config.base_url.clone(),
            Arc::new(transport),
            Arc::new(TracingObserver),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a route and classify the outcome.
    pub async fn make_request<R: Route>(&self, route: &R) -> Result<R::Response> {
        let url = format!("{}{}", self.base_url, route.path());
        let request = HttpRequest {
            method: route.method(),
            url: url.clone(),
            query: route.query(),
            body: route.body()?,
        };

        tracing::debug!(method = %request.method, url = %url, "Sending API request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(TransportError::Failed(cause)) => {
                self.report(&url, None, None, Some(&cause));
                return Err(SdkError::TransportFailure { cause });
            }
            Err(TransportError::NoResponse) => {
                self.report(&url, None, None, Some("received no response"));
                return Err(SdkError::Other);
            }
        };

        self.log_status_message(&url, &response.headers);

        if !(200..300).contains(&response.status) {
            return Err(self.classify_failure(&url, &response));
        }

        let Some(data) = response.body.as_deref() else {
            self.report(&url, Some(response.status), None, Some("received no data"));
            return Err(SdkError::Other);
        };

        route
            .parse_response(data, &response.headers)
            .inspect_err(|e| {
                let detail = e.to_string();
                self.report(&url, Some(response.status), None, Some(&detail));
            })
    }

    /// Send a route in the background and deliver the result once.
    pub fn dispatch<R, F>(&self, route: R, on_complete: F) -> JoinHandle<()>
    where
        R: Route + 'static,
        F: FnOnce(Result<R::Response>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.make_request(&route).await;
            on_complete(result);
        })
    }

    /// Classify a non-2xx response, preferring the structured envelope.
    fn classify_failure(&self, url: &str, response: &HttpResponse) -> SdkError {
        let api_error = decode_error_envelope(response.body.as_deref());

        match &api_error {
            Some(error) => self.report(
                url,
                Some(response.status),
                Some(&error.code),
                Some(&error.message),
            ),
            None => {
                let text = response
                    .body
                    .as_deref()
                    .map(String::from_utf8_lossy)
                    .filter(|t| !t.trim().is_empty());
                self.report(url, Some(response.status), None, text.as_deref());
            }
        }

        SdkError::from_status(response.status, api_error)
    }

    /// Surface the optional status hint headers. Never affects the result.
    fn log_status_message(&self, url: &str, headers: &HeaderMap) {
        let status = headers.get(STATUS_HEADER).and_then(|v| v.to_str().ok());
        let message = headers
            .get(STATUS_MESSAGE_HEADER)
            .and_then(|v| v.to_str().ok());

        if let (Some(status), Some(message)) = (status, message) {
            self.observer.status_message(url, status, message);
        }
    }

    fn report(
        &self,
        url: &str,
        status: Option<u16>,
        error_code: Option<&str>,
        message: Option<&str>,
    ) {
        self.observer.request_failed(&RequestFailure {
            url,
            status,
            error_code,
            message,
        });
    }
}
