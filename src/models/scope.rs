// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data scope narrowing what a sync retrieves.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Restricts a sync to a subset of the consented contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_groups: Vec<ServiceGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub time_ranges: Vec<TimeRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroup {
    #[serde(rename = "id")]
    pub identifier: u64,
    pub service_types: Vec<ServiceType>,
}

/// A service and the object types requested from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceType {
    #[serde(rename = "id")]
    pub identifier: u64,
    pub service_object_types: Vec<ServiceObjectType>,
}

impl ServiceType {
    pub fn new(identifier: u64, object_types: Vec<ServiceObjectType>) -> Self {
        Self {
            identifier,
            service_object_types: object_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceObjectType {
    #[serde(rename = "id")]
    pub identifier: u64,
}

/// Absolute time window, serialized as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub from: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }
}
