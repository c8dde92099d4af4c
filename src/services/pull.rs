// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session pull orchestration.
//!
//! Handles the core workflow:
//! 1. Authorize and obtain a session (fatal on failure)
//! 2. Fetch the account list
//! 3. Concurrently stream session content: optional sync trigger, file
//!    list polling, per-file downloads and statistics aggregations
//! 4. Deliver one callback per item and one terminal callback per stream
//!
//! One item failing never ends the stream; a failed trigger or file list
//! poll does.

use chrono::Utc;
use futures_util::stream::{self, FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Result, SdkError};
use crate::models::{
    AccountsInfo, AggregationResult, FileContent, Scope, Session, SourceAccount, TimeRange,
};
use crate::routes::{FileListRoute, ReadAccountsRoute, ReadFileRoute, Route, TriggerSyncRoute};
use crate::services::api_client::ApiClient;
use crate::services::authorizer::{Authorizer, EnvAuthorizer};
use crate::services::operation::Operation;
use crate::services::queue::OperationQueue;
use crate::services::retry::{run_with_retry, RetryPolicy};
use crate::services::statistics::{StatisticsAggregationOperation, StatisticsSource};

/// Phase of the most recent pull run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    Idle,
    Authorizing,
    Fetching,
    Complete,
    Failed,
}

/// One statistics aggregation to run as part of a pull.
#[derive(Debug, Clone)]
pub struct HealthQuery {
    pub account: SourceAccount,
    pub metric: String,
    pub range: TimeRange,
}

impl HealthQuery {
    /// Item identifier used in callbacks: `{account_id}:{metric}`.
    pub fn item_id(&self) -> String {
        format!("{}:{}", self.account.id, self.metric)
    }
}

/// What to pull in one run.
#[derive(Debug, Clone, Default)]
pub struct PullRequest {
    /// Ask the server to sync before listing files
    pub trigger_sync: bool,
    /// Narrow the sync; implies a trigger
    pub scope: Option<Scope>,
    pub health_queries: Vec<HealthQuery>,
}

/// One successfully retrieved item.
#[derive(Debug, Clone, PartialEq)]
pub enum PulledItem {
    File(FileContent),
    Aggregation {
        item_id: String,
        result: AggregationResult,
    },
}

impl PulledItem {
    pub fn item_id(&self) -> &str {
        match self {
            PulledItem::File(file) => &file.identifier,
            PulledItem::Aggregation { item_id, .. } => item_id,
        }
    }
}

/// Failure attributable to a single item of the stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Item {item_id} failed: {error}")]
pub struct ItemError {
    pub item_id: String,
    #[source]
    pub error: SdkError,
}

/// Outcome delivered to the per-item callback.
pub type ItemOutcome = std::result::Result<PulledItem, ItemError>;

/// Client-side pull engine for one consent-gated session.
pub struct PullClient {
    config: Config,
    api: ApiClient,
    authorizer: Arc<dyn Authorizer>,
    statistics: Option<Arc<dyn StatisticsSource>>,
    queue: OperationQueue,
    retry: RetryPolicy,
    state: Mutex<PullState>,
}

impl PullClient {
    pub fn new(config: Config, api: ApiClient, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            queue: OperationQueue::new(config.max_concurrent_items),
            retry: RetryPolicy::from_config(&config),
            config,
            api,
            authorizer,
            statistics: None,
            state: Mutex::new(PullState::Idle),
        }
    }

    /// Production client: reqwest transport, session key from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let authorizer = Arc::new(EnvAuthorizer::from_config(&config));
        Ok(Self::new(config, api, authorizer))
    }

    /// Enable statistics aggregation against a local source.
    pub fn with_statistics_source(mut self, source: Arc<dyn StatisticsSource>) -> Self {
        self.statistics = Some(source);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> PullState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: PullState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        tracing::debug!(state = ?state, "Pull state changed");
    }

    /// Send any route in the background; `on_complete` fires exactly once.
    pub fn dispatch<R, F>(&self, route: R, on_complete: F) -> JoinHandle<()>
    where
        R: Route + 'static,
        F: FnOnce(Result<R::Response>) + Send + 'static,
    {
        self.api.dispatch(route, on_complete)
    }

    /// Obtain a session, rejecting sessions that are already expired.
    pub async fn authorize(&self) -> Result<Session> {
        let session = self.authorizer.authorize().await?;
        if session.is_expired(Utc::now()) {
            return Err(SdkError::Authorization("session has expired".to_string()));
        }
        Ok(session)
    }

    pub async fn read_accounts(&self, session: &Session) -> Result<AccountsInfo> {
        self.api
            .make_request(&ReadAccountsRoute {
                session_key: session.key.clone(),
            })
            .await
    }

    /// Run one aggregation on the shared queue.
    ///
    /// `on_complete` fires at most once, and never after the returned
    /// operation has been cancelled.
    pub fn run_aggregation<F>(
        &self,
        account: SourceAccount,
        metric: &str,
        range: TimeRange,
        on_complete: F,
    ) -> Result<Arc<StatisticsAggregationOperation>>
    where
        F: FnOnce(Result<AggregationResult>) + Send + 'static,
    {
        let source = self.statistics_source()?;
        let operation = StatisticsAggregationOperation::new(source, account, metric, range);
        operation.set_completion(on_complete);
        self.queue.add(operation.clone());
        Ok(operation)
    }

    /// Cancel every queued or running aggregation. Pull aggregations
    /// waiting to retry are abandoned too.
    pub fn cancel_aggregations(&self) {
        self.queue.cancel_all();
    }

    /// Authorize, then fetch accounts and stream content concurrently.
    ///
    /// Returns the authorization error without invoking any callback if
    /// authorization fails. Otherwise `on_accounts` fires once, `on_item`
    /// fires once per item, and `on_complete` fires once after every item
    /// callback of the content stream.
    pub async fn pull_session<A, I, C>(
        &self,
        request: &PullRequest,
        on_accounts: A,
        mut on_item: I,
        on_complete: C,
    ) -> Result<Session>
    where
        A: FnOnce(Result<AccountsInfo>) + Send,
        I: FnMut(ItemOutcome) + Send,
        C: FnOnce(Result<()>) + Send,
    {
        self.set_state(PullState::Authorizing);
        let session = match self.authorize().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Authorization failed, aborting pull");
                self.set_state(PullState::Failed);
                return Err(e);
            }
        };
        tracing::info!("Authorization succeeded");
        self.set_state(PullState::Fetching);

        let accounts = async {
            let result = self.read_accounts(&session).await;
            match &result {
                Ok(info) => tracing::info!(count = info.accounts.len(), "Accounts retrieved"),
                Err(e) => tracing::warn!(error = %e, "Failed to retrieve accounts"),
            }
            on_accounts(result);
        };

        let content = async {
            let result = self.stream_content(&session, request, &mut on_item).await;
            match &result {
                Ok(()) => tracing::info!("Session content stream complete"),
                Err(e) => tracing::error!(error = %e, "Session content stream failed"),
            }
            on_complete(result);
        };

        tokio::join!(accounts, content);
        self.set_state(PullState::Complete);
        Ok(session)
    }

    fn statistics_source(&self) -> Result<Arc<dyn StatisticsSource>> {
        self.statistics
            .clone()
            .ok_or_else(|| SdkError::DataSource("no statistics source configured".to_string()))
    }

    /// Run file retrieval and aggregations side by side, funnelling item
    /// outcomes through one channel so `on_item` is only ever called here.
    async fn stream_content<I>(
        &self,
        session: &Session,
        request: &PullRequest,
        on_item: &mut I,
    ) -> Result<()>
    where
        I: FnMut(ItemOutcome) + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let files = self.stream_files(session, request, tx.clone());
        let aggregations = self.stream_aggregations(request, tx);
        let deliver = async {
            let mut delivered = 0usize;
            while let Some(outcome) = rx.recv().await {
                on_item(outcome);
                delivered += 1;
            }
            delivered
        };

        let (files_result, (), delivered) = tokio::join!(files, aggregations, deliver);
        tracing::debug!(delivered, "Item stream drained");
        files_result
    }

    async fn stream_files(
        &self,
        session: &Session,
        request: &PullRequest,
        tx: mpsc::UnboundedSender<ItemOutcome>,
    ) -> Result<()> {
        if request.trigger_sync || request.scope.is_some() {
            let triggered = self
                .api
                .make_request(&TriggerSyncRoute {
                    session_key: session.key.clone(),
                    scope: request.scope.clone(),
                })
                .await?;
            tracing::info!(status = ?triggered.status, "Sync triggered");
        }

        // name -> last seen updated date; a changed date means re-fetch
        let mut seen: HashMap<String, Option<i64>> = HashMap::new();
        let max_polls = self.config.max_file_list_polls.max(1);

        for poll in 1..=max_polls {
            let list = self
                .api
                .make_request(&FileListRoute {
                    session_key: session.key.clone(),
                })
                .await?;

            let mut pending = Vec::new();
            for file in list.file_list {
                if seen.get(&file.name) != Some(&file.updated_date) {
                    seen.insert(file.name.clone(), file.updated_date);
                    pending.push(file.name);
                }
            }

            tracing::debug!(
                poll,
                state = ?list.status.state,
                new_files = pending.len(),
                "File list polled"
            );

            stream::iter(pending)
                .map(|file_id| self.fetch_file(session, file_id))
                .buffer_unordered(self.config.max_concurrent_items.max(1))
                .for_each(|outcome| {
                    let _ = tx.send(outcome);
                    futures_util::future::ready(())
                })
                .await;

            if !list.status.state.is_in_progress() {
                return Ok(());
            }
            if poll < max_polls {
                tokio::time::sleep(self.config.file_list_poll_interval).await;
            }
        }

        tracing::warn!(
            polls = max_polls,
            "Sync still running after maximum file list polls"
        );
        Err(SdkError::Other)
    }

    async fn fetch_file(&self, session: &Session, file_id: String) -> ItemOutcome {
        let route = ReadFileRoute {
            session_key: session.key.clone(),
            file_id,
        };

        match self.api.make_request(&route).await {
            Ok(file) => Ok(PulledItem::File(file)),
            Err(error) => {
                tracing::warn!(file_id = %route.file_id, error = %error, "Failed to retrieve file");
                Err(ItemError {
                    item_id: route.file_id,
                    error,
                })
            }
        }
    }

    async fn stream_aggregations(
        &self,
        request: &PullRequest,
        tx: mpsc::UnboundedSender<ItemOutcome>,
    ) {
        let generation = self.queue.generation();
        let mut pending: FuturesUnordered<_> = request
            .health_queries
            .iter()
            .map(|query| async move {
                (query.item_id(), self.aggregate(query, generation).await)
            })
            .collect();

        while let Some((item_id, outcome)) = pending.next().await {
            let outcome = match outcome {
                Some(Ok(result)) => Ok(PulledItem::Aggregation { item_id, result }),
                Some(Err(error)) => Err(ItemError { item_id, error }),
                None => {
                    tracing::debug!(item_id = %item_id, "Aggregation cancelled, no item delivered");
                    continue;
                }
            };
            let _ = tx.send(outcome);
        }
    }

    /// One aggregation with retries; `None` if it was cancelled, including
    /// by `cancel_aggregations` while waiting between attempts.
    async fn aggregate(
        &self,
        query: &HealthQuery,
        generation: u64,
    ) -> Option<Result<AggregationResult>> {
        let source = match self.statistics_source() {
            Ok(source) => source,
            Err(e) => return Some(Err(e)),
        };

        let cancelled = self.queue.cancelled_since(generation);
        run_with_retry(&self.retry, cancelled, |attempt| {
            if attempt > 0 {
                tracing::info!(item_id = %query.item_id(), attempt, "Retrying aggregation");
            }
            let operation = StatisticsAggregationOperation::new(
                source.clone(),
                query.account.clone(),
                query.metric.clone(),
                query.range.clone(),
            );
            let handle = operation.handle();
            let _ = self.queue.add(operation as Arc<dyn Operation>);
            handle.wait()
        })
        .await
    }
}
