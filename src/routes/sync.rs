// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sync trigger.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;

use super::{decode_json, encode_json, Route};
use crate::error::Result;
use crate::models::{Scope, SyncTriggered};

/// `POST /permission-access/trigger`
///
/// Asks the server to (re)collect session data, optionally narrowed to
/// a scope.
#[derive(Debug, Clone)]
pub struct TriggerSyncRoute {
    pub session_key: String,
    pub scope: Option<Scope>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerSyncBody<'a> {
    session_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a Scope>,
}

impl Route for TriggerSyncRoute {
    type Response = SyncTriggered;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/permission-access/trigger".to_string()
    }

    fn body(&self) -> Result<Option<Vec<u8>>> {
        encode_json(&TriggerSyncBody {
            session_key: &self.session_key,
            scope: self.scope.as_ref(),
        })
    }

    fn parse_response(&self, data: &[u8], _headers: &HeaderMap) -> Result<SyncTriggered> {
        decode_json(data)
    }
}
