// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the pull engine.

pub mod account;
pub mod activity;
pub mod file;
pub mod metric;
pub mod scope;
pub mod session;
pub mod stats;

pub use account::{AccountService, AccountsInfo, SourceAccount};
pub use activity::{AggregationResult, Distance, FitnessActivitySummary};
pub use file::{FileContent, FileList, FileListItem, SyncState, SyncStatus, SyncTriggered};
pub use metric::{AggregationMode, MetricSpec, SummaryField};
pub use scope::{Scope, ServiceGroup, ServiceObjectType, ServiceType, TimeRange};
pub use session::Session;
pub use stats::{StatisticsBucket, StatisticsCollection, StatisticsQuery};
