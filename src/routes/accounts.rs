// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account listing for a session.

use reqwest::header::HeaderMap;

use super::{decode_json, query_path, Route};
use crate::error::Result;
use crate::models::AccountsInfo;

/// `GET /permission-access/query/{session}/accounts.json`
#[derive(Debug, Clone)]
pub struct ReadAccountsRoute {
    pub session_key: String,
}

impl Route for ReadAccountsRoute {
    type Response = AccountsInfo;

    fn path(&self) -> String {
        query_path(&self.session_key, &["accounts.json"])
    }

    fn parse_response(&self, data: &[u8], _headers: &HeaderMap) -> Result<AccountsInfo> {
        decode_json(data)
    }
}
