// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - dispatch, operations and pull orchestration.

pub mod api_client;
pub mod authorizer;
pub mod observer;
pub mod operation;
pub mod pull;
pub mod queue;
pub mod retry;
pub mod sample_store;
pub mod statistics;
pub mod transport;

pub use api_client::ApiClient;
pub use authorizer::{Authorizer, EnvAuthorizer};
pub use observer::{RequestFailure, RequestObserver, TracingObserver};
pub use operation::{Operation, OperationHandle, OperationState, RetryableOperation};
pub use pull::{HealthQuery, ItemError, ItemOutcome, PullClient, PullRequest, PullState, PulledItem};
pub use queue::OperationQueue;
pub use retry::{run_with_retry, RetryPolicy};
pub use sample_store::{Sample, SampleStore};
pub use statistics::{StatisticsAggregationOperation, StatisticsSource};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
