//! Sync coordinator: runs every collector for one user concurrently and
//! reports how each one fared.
//!
//! A failing collector never cancels or fails its siblings. Instead of
//! swallowing failures, `sync_all` returns them in the `SyncReport`, and the
//! caller decides whether to await, log or ignore it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::collectors::{
    Collector, CollectorKind, CollectorReport, FollowersCollector, FollowsCollector, LanguagesCollector,
    NetworkStarsCollector, StarsCollector,
};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::github::GitHubClient;
use crate::models::{StarOwner, Table};
use crate::store::{to_row, SyncStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollectorOutcome {
    Succeeded(CollectorReport),
    Failed { kind: CollectorKind, error: String },
}

impl CollectorOutcome {
    pub fn kind(&self) -> CollectorKind {
        match self {
            CollectorOutcome::Succeeded(report) => report.kind,
            CollectorOutcome::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CollectorOutcome::Succeeded(_))
    }
}

/// Result of one `sync_all` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<CollectorOutcome>,
}

impl SyncReport {
    /// True when every collector succeeded
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(CollectorOutcome::is_success)
    }

    pub fn failed_collectors(&self) -> Vec<CollectorKind> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(CollectorOutcome::kind)
            .collect()
    }

    pub fn outcome(&self, kind: CollectorKind) -> Option<&CollectorOutcome> {
        self.outcomes.iter().find(|o| o.kind() == kind)
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                CollectorOutcome::Succeeded(report) => report.rows_written,
                CollectorOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

pub struct SyncCoordinator {
    store: Arc<dyn SyncStore>,
    config: SyncConfig,
    collectors: Vec<Box<dyn Collector>>,
}

impl SyncCoordinator {
    /// Coordinator running the five standard collectors against `store`
    pub fn new(store: Arc<dyn SyncStore>, config: SyncConfig) -> Self {
        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(StarsCollector::new(store.clone())),
            Box::new(FollowsCollector::new(store.clone())),
            Box::new(FollowersCollector::new(store.clone())),
            Box::new(LanguagesCollector::new(store.clone())),
            Box::new(NetworkStarsCollector::new(store.clone(), config.follow_limit)),
        ];
        Self::with_collectors(store, config, collectors)
    }

    pub fn with_collectors(store: Arc<dyn SyncStore>, config: SyncConfig, collectors: Vec<Box<dyn Collector>>) -> Self {
        Self {
            store,
            config,
            collectors,
        }
    }

    pub fn store(&self) -> &Arc<dyn SyncStore> {
        &self.store
    }

    /// Run every collector for `user_id` concurrently and wait for all of them.
    ///
    /// Only fails if the GitHub client cannot be built; collector failures
    /// end up in the report.
    pub async fn sync_all(&self, user_id: &str, access_token: &str) -> Result<SyncReport> {
        let github = GitHubClient::with_config(access_token.to_string(), &self.config)?;
        let started_at = Utc::now();

        info!(user_id, collectors = self.collectors.len(), "Starting GitHub account sync");

        let runs = self.collectors.iter().map(|collector| {
            let kind = collector.kind();
            let github = &github;
            async move {
                match collector.collect(user_id, github).await {
                    Ok(report) => CollectorOutcome::Succeeded(report),
                    Err(e) => {
                        error!(user_id, collector = %kind, status = ?e.status(), "Collector failed: {}", e);
                        CollectorOutcome::Failed {
                            kind,
                            error: e.to_string(),
                        }
                    }
                }
            }
            .instrument(info_span!("collector", collector = %kind))
        });

        let outcomes = join_all(runs).await;

        let report = SyncReport {
            user_id: user_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            user_id,
            complete = report.is_complete(),
            failed = ?report.failed_collectors(),
            rows = report.rows_written(),
            "GitHub account sync finished"
        );
        Ok(report)
    }

    /// `sync_all` bounded by `SyncConfig::sync_timeout`, when one is set
    pub async fn sync_all_with_timeout(&self, user_id: &str, access_token: &str) -> Result<SyncReport> {
        match self.config.sync_timeout {
            Some(limit) => tokio::time::timeout(limit, self.sync_all(user_id, access_token))
                .await
                .map_err(|_| SyncError::Timeout(limit))?,
            None => self.sync_all(user_id, access_token).await,
        }
    }

    /// Run a sync on its own task. Dropping the handle detaches it.
    pub fn spawn_sync(self: &Arc<Self>, user_id: String, access_token: String) -> JoinHandle<Result<SyncReport>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.sync_all_with_timeout(&user_id, &access_token).await })
    }

    /// Hand every network star collected for `github_user_id` to the now
    /// registered `user_id`. Returns the number of rows re-keyed.
    pub async fn merge_network_stars(&self, user_id: &str, github_user_id: i64) -> Result<u64> {
        let patch = to_row(&StarOwner::Registered {
            user_id: user_id.to_string(),
        })?;

        let merged = self
            .store
            .update_where(Table::NetworkStars, "github_user_id", json!(github_user_id), patch)
            .await?;

        info!(user_id, github_user_id, merged, "Merged network stars into user");
        Ok(merged)
    }
}
