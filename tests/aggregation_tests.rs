// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics aggregation through the pull client and the sample store.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::{scripted_client, test_config};
use consent_pull::models::metric::{
    ACTIVE_ENERGY_BURNED, DISTANCE_WALKING_RUNNING, EXERCISE_TIME, STEP_COUNT,
};
use consent_pull::models::{
    AggregationResult, Session, SourceAccount, StatisticsCollection, StatisticsQuery, TimeRange,
};
use consent_pull::services::{
    Authorizer, Operation, OperationState, PullClient, Sample, SampleStore, StatisticsSource,
};
use consent_pull::{Result, SdkError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

struct StaticAuthorizer;

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self) -> Result<Session> {
        Ok(Session::new("s1"))
    }
}

fn pull_client(source: Arc<dyn StatisticsSource>) -> PullClient {
    let (api, _transport, _observer) = scripted_client();
    PullClient::new(test_config(), api, Arc::new(StaticAuthorizer)).with_statistics_source(source)
}

/// Run one aggregation and wait for its completion handler.
async fn aggregate(
    client: &PullClient,
    metric: &str,
    range: TimeRange,
) -> Result<AggregationResult> {
    let (tx, rx) = oneshot::channel();
    client
        .run_aggregation(SourceAccount::local("device"), metric, range, move |result| {
            let _ = tx.send(result);
        })
        .expect("statistics source configured");
    rx.await.expect("completion should fire")
}

/// Source that blocks until cancelled, signalling when a query begins.
struct BlockingSource {
    entered: Notify,
}

#[async_trait]
impl StatisticsSource for BlockingSource {
    async fn query_statistics(&self, _query: &StatisticsQuery) -> Result<StatisticsCollection> {
        self.entered.notify_one();
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_buckets_past_requested_end_are_discarded() {
    let store = SampleStore::new();
    for d in 1..=5 {
        store.add(STEP_COUNT, Sample::new(at(d, 9), at(d, 10), 1000.0));
    }
    let client = pull_client(Arc::new(store));

    // The Jan 5 bucket would end on Jan 6 and must be dropped, not clipped
    let result = aggregate(&client, STEP_COUNT, TimeRange::new(at(1, 0), at(5, 12)))
        .await
        .unwrap();

    let summaries = result.summaries(STEP_COUNT);
    assert_eq!(summaries.len(), 4);
    assert!(summaries.iter().all(|s| s.end_date <= at(5, 12)));
    assert!(summaries.iter().all(|s| s.steps == 1000.0));
}

#[tokio::test]
async fn test_summaries_are_newest_first() {
    let store = SampleStore::new();
    store.add(STEP_COUNT, Sample::new(at(1, 8), at(1, 9), 100.0));
    store.add(STEP_COUNT, Sample::new(at(2, 8), at(2, 9), 200.0));
    store.add(STEP_COUNT, Sample::new(at(3, 8), at(3, 9), 300.0));
    let client = pull_client(Arc::new(store));

    let result = aggregate(&client, STEP_COUNT, TimeRange::new(at(1, 0), at(4, 0)))
        .await
        .unwrap();

    let starts: Vec<_> = result
        .summaries(STEP_COUNT)
        .iter()
        .map(|s| s.start_date)
        .collect();
    assert_eq!(starts, vec![at(3, 0), at(2, 0), at(1, 0)]);

    let steps: Vec<_> = result.summaries(STEP_COUNT).iter().map(|s| s.steps).collect();
    assert_eq!(steps, vec![300.0, 200.0, 100.0]);
    assert_eq!(result.account, SourceAccount::local("device"));
}

#[tokio::test]
async fn test_metric_fields_and_units() {
    let store = SampleStore::new();
    store.add(
        DISTANCE_WALKING_RUNNING,
        Sample::new(at(1, 8), at(1, 9), 5000.0),
    );
    store.add(ACTIVE_ENERGY_BURNED, Sample::new(at(1, 8), at(1, 9), 320.0));
    // Exercise time is the total sample span: 30 minutes
    store.add(EXERCISE_TIME, Sample::new(at(1, 8), at(1, 8) + chrono::Duration::minutes(30), 1.0));
    let client = pull_client(Arc::new(store));
    let range = TimeRange::new(at(1, 0), at(2, 0));

    let distance = aggregate(&client, DISTANCE_WALKING_RUNNING, range.clone())
        .await
        .unwrap();
    let summary = &distance.summaries(DISTANCE_WALKING_RUNNING)[0];
    assert_eq!(summary.total_distance(), 5.0);
    assert_eq!(summary.distances[0].activity, "total");
    assert_eq!(summary.steps, 0.0);

    let calories = aggregate(&client, ACTIVE_ENERGY_BURNED, range.clone())
        .await
        .unwrap();
    assert_eq!(calories.summaries(ACTIVE_ENERGY_BURNED)[0].calories_out, 320.0);

    let exercise = aggregate(&client, EXERCISE_TIME, range).await.unwrap();
    assert_eq!(exercise.summaries(EXERCISE_TIME)[0].activity, 30);
}

#[tokio::test]
async fn test_unknown_metric_yields_empty_fields() {
    let store = SampleStore::new();
    store.add("heart_rate", Sample::new(at(1, 8), at(1, 9), 72.0));
    let client = pull_client(Arc::new(store));

    let result = aggregate(&client, "heart_rate", TimeRange::new(at(1, 0), at(2, 0)))
        .await
        .unwrap();

    let summary = &result.summaries("heart_rate")[0];
    assert_eq!(summary.steps, 0.0);
    assert_eq!(summary.calories_out, 0.0);
    assert_eq!(summary.activity, 0);
    assert_eq!(summary.total_distance(), 0.0);
}

#[tokio::test]
async fn test_source_failure_is_delivered() {
    let store = SampleStore::new();
    store.fail_metric(STEP_COUNT, SdkError::DataSource("store locked".to_string()));
    let client = pull_client(Arc::new(store));

    let err = aggregate(&client, STEP_COUNT, TimeRange::new(at(1, 0), at(2, 0)))
        .await
        .unwrap_err();

    assert_eq!(err, SdkError::DataSource("store locked".to_string()));
}

#[tokio::test]
async fn test_aggregation_without_source_is_rejected() {
    let (api, _transport, _observer) = scripted_client();
    let client = PullClient::new(test_config(), api, Arc::new(StaticAuthorizer));

    let err = client
        .run_aggregation(
            SourceAccount::local("device"),
            STEP_COUNT,
            TimeRange::new(at(1, 0), at(2, 0)),
            |_| {},
        )
        .unwrap_err();

    assert!(matches!(err, SdkError::DataSource(_)));
}

#[tokio::test]
async fn test_cancel_during_query_suppresses_completion() {
    let source = Arc::new(BlockingSource {
        entered: Notify::new(),
    });
    let client = pull_client(source.clone());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let operation = client
        .run_aggregation(
            SourceAccount::local("device"),
            STEP_COUNT,
            TimeRange::new(at(1, 0), at(2, 0)),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

    source.entered.notified().await;
    assert_eq!(operation.state(), OperationState::Running);

    operation.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(operation.state(), OperationState::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_all_aggregations() {
    let source = Arc::new(BlockingSource {
        entered: Notify::new(),
    });
    let client = pull_client(source.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let operations: Vec<_> = (0..3)
        .map(|_| {
            let counter = calls.clone();
            client
                .run_aggregation(
                    SourceAccount::local("device"),
                    STEP_COUNT,
                    TimeRange::new(at(1, 0), at(2, 0)),
                    move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    },
                )
                .unwrap()
        })
        .collect();

    source.entered.notified().await;
    client.cancel_aggregations();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(operations
        .iter()
        .all(|op| op.state() == OperationState::Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
