// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Consent-Pull: client-side data pull engine
//!
//! This crate dispatches typed requests against a consent-gated API,
//! runs cancellable statistics aggregations over local health data, and
//! streams session content back to the caller item by item.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use error::{Result, SdkError};
pub use services::{ApiClient, PullClient};
