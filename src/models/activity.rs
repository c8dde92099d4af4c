// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness activity summaries produced by statistics aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::SourceAccount;

/// One statistics bucket materialized with fitness fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessActivitySummary {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Step count
    pub steps: f64,
    /// Distances in kilometers, one entry per activity kind
    pub distances: Vec<Distance>,
    /// Active energy burned (kcal)
    pub calories_out: f64,
    /// Minutes of exercise
    pub activity: i64,
    /// Account the data was read from
    pub account: SourceAccount,
}

impl FitnessActivitySummary {
    /// Distance across all activity kinds.
    pub fn total_distance(&self) -> f64 {
        self.distances.iter().map(|d| d.distance).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    /// Activity kind ("total" for the aggregate)
    pub activity: String,
    pub distance: f64,
}

/// Output of one completed aggregation operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub account: SourceAccount,
    /// Summaries keyed by metric identifier, newest first
    pub data: HashMap<String, Vec<FitnessActivitySummary>>,
}

impl AggregationResult {
    pub fn summaries(&self, metric: &str) -> &[FitnessActivitySummary] {
        self.data.get(metric).map(Vec::as_slice).unwrap_or(&[])
    }
}
