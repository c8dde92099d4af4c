// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consent-Pull command line runner
//!
//! Authorizes with a pre-issued session key, then pulls the session's
//! accounts and files, logging each item as it arrives.

use anyhow::Context;
use chrono::SecondsFormat;
use consent_pull::{
    config::Config,
    services::{PullClient, PullRequest, PulledItem},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        base_url = %config.base_url,
        contract_id = %config.contract_id,
        "Starting Consent-Pull"
    );

    let client = PullClient::from_config(config).context("Failed to build pull client")?;
    let request = PullRequest {
        trigger_sync: true,
        ..PullRequest::default()
    };

    let mut files = 0usize;
    let mut aggregations = 0usize;
    let mut failures = 0usize;
    let session = client
        .pull_session(
            &request,
            |accounts| match accounts {
                Ok(info) => {
                    for account in &info.accounts {
                        tracing::info!(account_id = %account.id, name = ?account.name, "Account");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to retrieve accounts"),
            },
            |item| match item {
                Ok(item) => {
                    match &item {
                        PulledItem::File(_) => files += 1,
                        PulledItem::Aggregation { .. } => aggregations += 1,
                    }
                    tracing::info!(item_id = %item.item_id(), "Item retrieved");
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(item_id = %e.item_id, error = %e.error, "Item failed");
                }
            },
            |result| match result {
                Ok(()) => tracing::info!("All session content retrieved"),
                Err(e) => tracing::error!(error = %e, "Session content retrieval failed"),
            },
        )
        .await
        .context("Authorization failed")?;

    tracing::info!(
        session_expires = ?session
            .expires_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        files,
        aggregations,
        failures,
        "Pull finished"
    );
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("consent_pull=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
