// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics aggregation over the local data source.
//!
//! Handles:
//! 1. Querying the source for day-sized buckets over the requested window
//! 2. Dropping buckets that end past the window (discarded, not clipped)
//! 3. Mapping each bucket's value into the metric's summary field
//! 4. Ordering summaries newest first

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::models::metric::{self, MetricSpec, SummaryField};
use crate::models::{
    AggregationResult, Distance, FitnessActivitySummary, SourceAccount, StatisticsCollection,
    StatisticsQuery, TimeRange,
};
use crate::services::operation::{Operation, OperationHandle, OperationState, RetryableOperation};

/// Width of every statistics bucket.
pub fn bucket_interval() -> Duration {
    Duration::days(1)
}

/// Local store of time-series samples answering bucketed range queries.
///
/// Must support concurrent queries without interference.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    async fn query_statistics(&self, query: &StatisticsQuery) -> Result<StatisticsCollection>;
}

/// Aggregates one metric for one account over one time window.
///
/// Single-shot: once finished or cancelled, build a new instance to retry.
pub struct StatisticsAggregationOperation {
    core: RetryableOperation<AggregationResult>,
    source: Arc<dyn StatisticsSource>,
    account: SourceAccount,
    metric: String,
    range: TimeRange,
}

impl std::fmt::Debug for StatisticsAggregationOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsAggregationOperation")
            .field("account", &self.account)
            .field("metric", &self.metric)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl StatisticsAggregationOperation {
    pub fn new(
        source: Arc<dyn StatisticsSource>,
        account: SourceAccount,
        metric: impl Into<String>,
        range: TimeRange,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: RetryableOperation::new(),
            source,
            account,
            metric: metric.into(),
            range,
        })
    }

    /// Install a completion callback. Must be called before the operation starts.
    pub fn set_completion<F>(&self, completion: F) -> bool
    where
        F: FnOnce(Result<AggregationResult>) + Send + 'static,
    {
        self.core.set_completion(completion)
    }

    /// Awaitable, cancellable handle. Replaces any callback set earlier.
    pub fn handle(self: &Arc<Self>) -> OperationHandle<AggregationResult> {
        let receiver = self.core.completion_channel();
        OperationHandle::new(self.clone(), receiver)
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn account(&self) -> &SourceAccount {
        &self.account
    }

    /// Query and summarize. `None` when cancelled while the query was in flight.
    async fn execute(&self) -> Option<Result<AggregationResult>> {
        let spec = metric::lookup(&self.metric);
        let query = StatisticsQuery {
            metric: self.metric.clone(),
            mode: spec.mode,
            interval: bucket_interval(),
            start: self.range.from,
            end: self.range.to,
        };

        tracing::debug!(
            account_id = %self.account.id,
            metric = %self.metric,
            mode = ?spec.mode,
            start = %query.start,
            end = %query.end,
            "Querying statistics"
        );

        let outcome = tokio::select! {
            outcome = self.source.query_statistics(&query) => outcome,
            _ = self.core.cancelled() => return None,
        };

        let collection = match outcome {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(
                    account_id = %self.account.id,
                    metric = %self.metric,
                    error = %e,
                    "Statistics query failed"
                );
                return Some(Err(e));
            }
        };

        let summaries = summarize(&collection, &spec, self.range.to, &self.account);
        tracing::info!(
            account_id = %self.account.id,
            metric = %self.metric,
            buckets = collection.buckets.len(),
            summaries = summaries.len(),
            "Statistics aggregated"
        );

        Some(Ok(AggregationResult {
            account: self.account.clone(),
            data: HashMap::from([(self.metric.clone(), summaries)]),
        }))
    }
}

#[async_trait]
impl Operation for StatisticsAggregationOperation {
    async fn run(&self) {
        if !self.core.start() {
            tracing::debug!(metric = %self.metric, "Aggregation cancelled before start");
            return;
        }

        match self.execute().await {
            Some(result) => {
                self.core.finish_with(result);
            }
            None => {
                tracing::debug!(metric = %self.metric, "Aggregation cancelled during query");
            }
        }
    }

    fn cancel(&self) {
        self.core.cancel();
    }

    fn state(&self) -> OperationState {
        self.core.state()
    }
}

/// Turn buckets into summaries, newest first.
///
/// Buckets ending after `end` are dropped entirely, even if they overlap
/// the window.
pub fn summarize(
    collection: &StatisticsCollection,
    spec: &MetricSpec,
    end: DateTime<Utc>,
    account: &SourceAccount,
) -> Vec<FitnessActivitySummary> {
    let mut summaries: Vec<FitnessActivitySummary> = collection
        .buckets
        .iter()
        .filter(|bucket| bucket.end <= end)
        .map(|bucket| {
            let value = bucket.value(spec.mode).map(|raw| spec.convert(raw));
            let mut summary = FitnessActivitySummary {
                start_date: bucket.start,
                end_date: bucket.end,
                steps: 0.0,
                distances: Vec::new(),
                calories_out: 0.0,
                activity: 0,
                account: account.clone(),
            };
            let mut distance = 0.0;

            if let (Some(value), Some(field)) = (value, spec.field) {
                match field {
                    SummaryField::Steps => summary.steps = value,
                    SummaryField::Distance => distance = value,
                    SummaryField::Calories => summary.calories_out = value,
                    SummaryField::ActivityMinutes => summary.activity = value as i64,
                }
            }

            summary.distances.push(Distance {
                activity: "total".to_string(),
                distance,
            });
            summary
        })
        .collect();

    summaries.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::models::metric::{DISTANCE_WALKING_RUNNING, EXERCISE_TIME, STEP_COUNT};
    use crate::models::StatisticsBucket;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn bucket(d: u32, sum: f64) -> StatisticsBucket {
        StatisticsBucket {
            sum: Some(sum),
            average: Some(sum / 2.0),
            duration: Some(sum * 60.0),
            ..StatisticsBucket::empty(day(d), day(d + 1))
        }
    }

    /// Returns a canned result and records the queries it saw.
    struct CannedSource {
        result: Result<StatisticsCollection>,
        queries: Mutex<Vec<StatisticsQuery>>,
    }

    #[async_trait]
    impl StatisticsSource for CannedSource {
        async fn query_statistics(&self, query: &StatisticsQuery) -> Result<StatisticsCollection> {
            self.queries.lock().unwrap().push(query.clone());
            self.result.clone()
        }
    }

    fn canned(result: Result<StatisticsCollection>) -> Arc<CannedSource> {
        Arc::new(CannedSource {
            result,
            queries: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_summaries_sorted_newest_first() {
        let collection = StatisticsCollection {
            buckets: vec![bucket(1, 100.0), bucket(2, 200.0), bucket(3, 300.0)],
        };

        let summaries = summarize(
            &collection,
            &metric::lookup(STEP_COUNT),
            day(4),
            &SourceAccount::local("device"),
        );

        let starts: Vec<_> = summaries.iter().map(|s| s.start_date).collect();
        assert_eq!(starts, vec![day(3), day(2), day(1)]);
        assert_eq!(summaries[0].steps, 300.0);
    }

    #[test]
    fn test_bucket_past_end_is_discarded() {
        let collection = StatisticsCollection {
            buckets: vec![bucket(4, 10.0), bucket(5, 20.0)],
        };
        let end = day(5) + Duration::hours(12);

        let summaries = summarize(
            &collection,
            &metric::lookup(STEP_COUNT),
            end,
            &SourceAccount::local("device"),
        );

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].end_date, day(5));
    }

    #[test]
    fn test_fields_follow_metric_table() {
        let collection = StatisticsCollection {
            buckets: vec![bucket(1, 3_500.0)],
        };
        let account = SourceAccount::local("device");

        let distance = summarize(
            &collection,
            &metric::lookup(DISTANCE_WALKING_RUNNING),
            day(2),
            &account,
        );
        assert_eq!(distance[0].total_distance(), 3.5);
        assert_eq!(distance[0].steps, 0.0);

        let minutes = summarize(&collection, &metric::lookup(EXERCISE_TIME), day(2), &account);
        assert_eq!(minutes[0].activity, 3_500);

        let unknown = summarize(&collection, &metric::lookup("heart_rate"), day(2), &account);
        assert_eq!(unknown[0].steps, 0.0);
        assert_eq!(unknown[0].total_distance(), 0.0);
        assert_eq!(unknown[0].calories_out, 0.0);
    }

    #[test]
    fn test_empty_bucket_yields_zero_summary() {
        let collection = StatisticsCollection {
            buckets: vec![StatisticsBucket::empty(day(1), day(2))],
        };

        let summaries = summarize(
            &collection,
            &metric::lookup(STEP_COUNT),
            day(2),
            &SourceAccount::local("device"),
        );

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].steps, 0.0);
        assert_eq!(summaries[0].distances[0].activity, "total");
    }

    #[tokio::test]
    async fn test_operation_queries_with_mode_and_interval() {
        let source = canned(Ok(StatisticsCollection {
            buckets: vec![bucket(1, 5.0)],
        }));
        let op = StatisticsAggregationOperation::new(
            source.clone(),
            SourceAccount::local("device"),
            EXERCISE_TIME,
            TimeRange::new(day(1), day(2)),
        );
        let handle = op.handle();

        op.run().await;

        let result = handle.wait().await.expect("not cancelled").expect("query ok");
        assert_eq!(result.summaries(EXERCISE_TIME).len(), 1);
        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].mode, metric::AggregationMode::Duration);
        assert_eq!(queries[0].interval, Duration::days(1));
    }

    #[tokio::test]
    async fn test_source_failure_is_propagated_verbatim() {
        let failure = SdkError::DataSource("store locked".to_string());
        let op = StatisticsAggregationOperation::new(
            canned(Err(failure.clone())),
            SourceAccount::local("device"),
            STEP_COUNT,
            TimeRange::new(day(1), day(2)),
        );
        let handle = op.handle();

        op.run().await;

        assert_eq!(handle.wait().await, Some(Err(failure)));
        assert_eq!(op.state(), OperationState::Finished);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_queries() {
        let source = canned(Ok(StatisticsCollection::default()));
        let op = StatisticsAggregationOperation::new(
            source.clone(),
            SourceAccount::local("device"),
            STEP_COUNT,
            TimeRange::new(day(1), day(2)),
        );
        let handle = op.handle();

        handle.cancel();
        op.run().await;

        assert!(handle.wait().await.is_none());
        assert!(source.queries.lock().unwrap().is_empty());
    }
}
