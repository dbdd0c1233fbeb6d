use crate::sync::SyncCoordinator;
use ractor::{
    factory::{FactoryMessage, Job, Worker, WorkerBuilder, WorkerId},
    ActorProcessingErr, ActorRef,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

// Job key - one user's jobs stick to one worker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncJobKey {
    pub user_id: String,
}

// Job payload - the actual work to do
#[derive(Clone)]
pub enum SyncJobPayload {
    SyncAccount { access_token: String },
    MergeNetworkStars { github_user_id: i64 },
}

impl std::fmt::Debug for SyncJobPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncJobPayload::SyncAccount { .. } => f
                .debug_struct("SyncAccount")
                .field("access_token", &"<redacted>")
                .finish(),
            SyncJobPayload::MergeNetworkStars { github_user_id } => f
                .debug_struct("MergeNetworkStars")
                .field("github_user_id", github_user_id)
                .finish(),
        }
    }
}

/// Totals shared by every worker and read by the supervisor
#[derive(Debug, Default)]
pub struct SyncCounters {
    pub syncs_completed: AtomicU64,
    pub syncs_partial: AtomicU64,
    pub syncs_failed: AtomicU64,
    pub network_stars_merged: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncCountersSnapshot {
    pub syncs_completed: u64,
    pub syncs_partial: u64,
    pub syncs_failed: u64,
    pub network_stars_merged: u64,
}

impl SyncCounters {
    pub fn snapshot(&self) -> SyncCountersSnapshot {
        SyncCountersSnapshot {
            syncs_completed: self.syncs_completed.load(Ordering::Relaxed),
            syncs_partial: self.syncs_partial.load(Ordering::Relaxed),
            syncs_failed: self.syncs_failed.load(Ordering::Relaxed),
            network_stars_merged: self.network_stars_merged.load(Ordering::Relaxed),
        }
    }
}

/// What every worker is started with
#[derive(Clone)]
pub struct SyncWorkerContext {
    pub coordinator: Arc<SyncCoordinator>,
    pub counters: Arc<SyncCounters>,
}

/// Worker that runs account syncs and network star merges
#[derive(Debug, Default)]
pub struct SyncWorker;

pub struct SyncWorkerState {
    context: SyncWorkerContext,
    jobs_processed: u64,
    last_activity: Instant,
}

#[ractor::async_trait]
impl Worker for SyncWorker {
    type Key = SyncJobKey;
    type Message = SyncJobPayload;
    type State = SyncWorkerState;
    type Arguments = SyncWorkerContext;

    async fn pre_start(
        &self,
        wid: WorkerId,
        _factory: &ActorRef<FactoryMessage<Self::Key, Self::Message>>,
        context: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(worker_id = ?wid, "Sync worker starting");

        Ok(SyncWorkerState {
            context,
            jobs_processed: 0,
            last_activity: Instant::now(),
        })
    }

    async fn handle(
        &self,
        wid: WorkerId,
        _factory: &ActorRef<FactoryMessage<Self::Key, Self::Message>>,
        Job { key, msg, .. }: Job<Self::Key, Self::Message>,
        state: &mut Self::State,
    ) -> Result<Self::Key, ActorProcessingErr> {
        debug!(worker_id = ?wid, ?key, job = ?msg, "Worker processing job");

        state.last_activity = Instant::now();
        let coordinator = &state.context.coordinator;
        let counters = &state.context.counters;

        match msg {
            SyncJobPayload::SyncAccount { access_token } => {
                match coordinator.sync_all_with_timeout(&key.user_id, &access_token).await {
                    Ok(report) if report.is_complete() => {
                        counters.syncs_completed.fetch_add(1, Ordering::Relaxed);
                        info!(worker_id = ?wid, user_id = %key.user_id, rows = report.rows_written(), "Sync completed");
                    }
                    Ok(report) => {
                        counters.syncs_partial.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            worker_id = ?wid,
                            user_id = %key.user_id,
                            failed = ?report.failed_collectors(),
                            "Sync finished with failed collectors"
                        );
                    }
                    Err(e) => {
                        counters.syncs_failed.fetch_add(1, Ordering::Relaxed);
                        error!(worker_id = ?wid, user_id = %key.user_id, "Sync failed: {}", e);
                    }
                }
            }
            SyncJobPayload::MergeNetworkStars { github_user_id } => {
                match coordinator.merge_network_stars(&key.user_id, github_user_id).await {
                    Ok(merged) => {
                        counters.network_stars_merged.fetch_add(merged, Ordering::Relaxed);
                    }
                    Err(e) => {
                        error!(worker_id = ?wid, user_id = %key.user_id, github_user_id, "Merge failed: {}", e);
                    }
                }
            }
        }

        state.jobs_processed += 1;
        Ok(key)
    }

    async fn post_stop(
        &self,
        wid: WorkerId,
        _factory: &ActorRef<FactoryMessage<Self::Key, Self::Message>>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        info!(
            worker_id = ?wid,
            jobs_processed = state.jobs_processed,
            idle_secs = state.last_activity.elapsed().as_secs(),
            "Sync worker stopped"
        );
        Ok(())
    }
}

/// Builder for sync workers
#[derive(Clone)]
pub struct SyncWorkerBuilder {
    context: SyncWorkerContext,
}

impl SyncWorkerBuilder {
    pub fn new(context: SyncWorkerContext) -> Self {
        Self { context }
    }
}

impl WorkerBuilder<SyncWorker, SyncWorkerContext> for SyncWorkerBuilder {
    fn build(&mut self, _wid: WorkerId) -> (SyncWorker, SyncWorkerContext) {
        (SyncWorker, self.context.clone())
    }
}
