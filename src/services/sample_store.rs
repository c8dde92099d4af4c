// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory statistics source.
//!
//! Holds raw samples per metric and answers bucketed range queries the
//! way a platform health store does: buckets are anchored at the query
//! start and keep coming while they start before the query end, so the
//! last one may run past it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{Result, SdkError};
use crate::models::{StatisticsBucket, StatisticsCollection, StatisticsQuery};
use crate::services::statistics::StatisticsSource;

/// One raw time-series sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Value in the metric's base unit (count, meters, kcal, ...)
    pub value: f64,
}

impl Sample {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, value: f64) -> Self {
        Self { start, end, value }
    }
}

/// Thread-safe sample store; clones share the same data.
#[derive(Clone, Default)]
pub struct SampleStore {
    samples: Arc<DashMap<String, Vec<Sample>>>,
    failures: Arc<DashMap<String, SdkError>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, metric: &str, sample: Sample) {
        self.samples
            .entry(metric.to_string())
            .or_default()
            .push(sample);
    }

    pub fn extend(&self, metric: &str, samples: impl IntoIterator<Item = Sample>) {
        self.samples
            .entry(metric.to_string())
            .or_default()
            .extend(samples);
    }

    /// Make every query for `metric` fail with `error` (simulates an
    /// unavailable or locked store).
    pub fn fail_metric(&self, metric: &str, error: SdkError) {
        self.failures.insert(metric.to_string(), error);
    }

    pub fn clear_failure(&self, metric: &str) {
        self.failures.remove(metric);
    }

    fn bucketize(&self, query: &StatisticsQuery) -> Vec<StatisticsBucket> {
        let samples = self
            .samples
            .get(&query.metric)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let mut buckets = Vec::new();
        let mut bucket_start = query.start;
        while bucket_start < query.end {
            let bucket_end = bucket_start + query.interval;
            let in_bucket: Vec<&Sample> = samples
                .iter()
                .filter(|s| s.start >= bucket_start && s.start < bucket_end)
                .collect();

            let mut bucket = StatisticsBucket::empty(bucket_start, bucket_end);
            if !in_bucket.is_empty() {
                let sum: f64 = in_bucket.iter().map(|s| s.value).sum();
                let seconds: i64 = in_bucket
                    .iter()
                    .map(|s| (s.end - s.start).num_seconds().max(0))
                    .sum();
                bucket.sum = Some(sum);
                bucket.average = Some(sum / in_bucket.len() as f64);
                bucket.duration = Some(seconds as f64);
            }
            buckets.push(bucket);
            bucket_start = bucket_end;
        }
        buckets
    }
}

#[async_trait]
impl StatisticsSource for SampleStore {
    async fn query_statistics(&self, query: &StatisticsQuery) -> Result<StatisticsCollection> {
        if let Some(error) = self.failures.get(&query.metric) {
            return Err(error.value().clone());
        }
        if query.interval <= chrono::Duration::zero() {
            return Err(SdkError::DataSource(format!(
                "Invalid bucket interval: {}",
                query.interval
            )));
        }
        if query.end < query.start {
            return Err(SdkError::DataSource(format!(
                "Query ends before it starts: {} < {}",
                query.end, query.start
            )));
        }

        Ok(StatisticsCollection {
            buckets: self.bucketize(query),
        })
    }
}
