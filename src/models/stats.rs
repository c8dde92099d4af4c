// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bucketed statistics exchanged with the local data source.

use chrono::{DateTime, Duration, Utc};

use crate::models::metric::AggregationMode;

/// One range query against the statistics source.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsQuery {
    pub metric: String,
    pub mode: AggregationMode,
    /// Bucket width; buckets are anchored at `start`
    pub interval: Duration,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Aggregates for one fixed time interval.
///
/// Each value is `None` when the bucket holds no samples or the source
/// did not compute that aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sum: Option<f64>,
    pub average: Option<f64>,
    /// Seconds covered by samples in the bucket
    pub duration: Option<f64>,
}

impl StatisticsBucket {
    pub fn empty(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            sum: None,
            average: None,
            duration: None,
        }
    }

    /// Value for the given aggregation mode.
    pub fn value(&self, mode: AggregationMode) -> Option<f64> {
        match mode {
            AggregationMode::CumulativeSum => self.sum,
            AggregationMode::DiscreteAverage => self.average,
            AggregationMode::Duration => self.duration,
        }
    }
}

/// Buckets returned for one query, in bucket order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsCollection {
    pub buckets: Vec<StatisticsBucket>,
}
