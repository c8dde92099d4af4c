// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP transport used by the dispatcher.
//!
//! The dispatcher only sees [`Transport`]; production code uses
//! [`ReqwestTransport`], tests script responses directly.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use std::time::Duration;

use crate::error::{Result, SdkError};

/// Transport-level request built from a route.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

/// Raw response: status, headers and body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// `None` when the server sent no body
    pub body: Option<Vec<u8>>,
}

/// Failure to obtain a usable HTTP response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS, timeout or other I/O failure
    #[error("{0}")]
    Failed(String),

    /// A reply arrived but could not be read as an HTTP response
    #[error("no valid HTTP response")]
    NoResponse,
}

/// Sends requests. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport that negotiates JSON on every request.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::TransportFailure {
                cause: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.http.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_body() || e.is_decode() {
                TransportError::NoResponse
            } else {
                TransportError::Failed(e.to_string())
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body: (!bytes.is_empty()).then(|| bytes.to_vec()),
        })
    }
}
