// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use consent_pull::config::Config;
use consent_pull::services::{
    ApiClient, HttpRequest, HttpResponse, RequestFailure, RequestObserver, Transport,
    TransportError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://api.test";

/// One scripted transport reply.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: Option<Vec<u8>>,
    },
    Fail(TransportError),
}

#[allow(dead_code)]
impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Respond {
            status,
            headers: vec![("content-type", "application/json")],
            body: Some(serde_json::to_vec(&body).expect("serializable body")),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            body: (!body.is_empty()).then(|| body.as_bytes().to_vec()),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.push((name, value));
        }
        self
    }
}

/// In-process transport that replies from a script keyed by URL path.
///
/// Each path holds a sequence of replies; the last one repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Vec<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        let url = format!("{}{}", BASE_URL, path);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        self.requests.lock().unwrap().push(request);

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&path) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if !queue.is_empty() => queue[0].clone(),
                _ => Reply::raw(404, "no script"),
            }
        };

        match reply {
            Reply::Respond {
                status,
                headers,
                body,
            } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    );
                }
                Ok(HttpResponse {
                    status,
                    headers: map,
                    body,
                })
            }
            Reply::Fail(error) => Err(error),
        }
    }
}

/// Observed dispatcher signal.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Signal {
    Status {
        url: String,
        status: String,
        message: String,
    },
    Failure {
        url: String,
        status: Option<u16>,
        error_code: Option<String>,
        message: Option<String>,
    },
}

/// Observer that records every signal it receives.
#[derive(Default)]
pub struct RecordingObserver {
    signals: Mutex<Vec<Signal>>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<Signal> {
        self.signals()
            .into_iter()
            .filter(|s| matches!(s, Signal::Failure { .. }))
            .collect()
    }
}

impl RequestObserver for RecordingObserver {
    fn status_message(&self, url: &str, status: &str, message: &str) {
        self.signals.lock().unwrap().push(Signal::Status {
            url: url.to_string(),
            status: status.to_string(),
            message: message.to_string(),
        });
    }

    fn request_failed(&self, failure: &RequestFailure<'_>) {
        self.signals.lock().unwrap().push(Signal::Failure {
            url: failure.url.to_string(),
            status: failure.status,
            error_code: failure.error_code.map(str::to_string),
            message: failure.message.map(str::to_string),
        });
    }
}

/// API client wired to a scripted transport and a recording observer.
#[allow(dead_code)]
pub fn scripted_client() -> (ApiClient, Arc<ScriptedTransport>, Arc<RecordingObserver>) {
    let transport = ScriptedTransport::new();
    let observer = RecordingObserver::new();
    let client = ApiClient::new(BASE_URL, transport.clone(), observer.clone());
    (client, transport, observer)
}

/// Test configuration pointing at the scripted base URL.
#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        session_key: Some("test-session".to_string()),
        ..Config::default()
    }
}
