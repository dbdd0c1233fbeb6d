use anyhow::Result;
use ractor::{
    factory::{discard::DiscardHandler, queues, routing, Factory, FactoryArguments, FactoryMessage},
    Actor, ActorRef,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::actors::sync_worker::{SyncJobKey, SyncJobPayload, SyncWorker, SyncWorkerBuilder, SyncWorkerContext};

/// Configuration for the sync worker factory
#[derive(Debug, Clone)]
pub struct SyncFactoryConfig {
    /// Number of workers to start initially
    pub num_initial_workers: usize,
    /// Time in seconds before considering a worker stuck
    pub dead_mans_switch_timeout_seconds: u64,
}

impl Default for SyncFactoryConfig {
    fn default() -> Self {
        Self {
            num_initial_workers: 4,
            dead_mans_switch_timeout_seconds: 3600,
        }
    }
}

/// Logs jobs the factory drops
#[derive(Debug, Clone)]
pub struct SyncJobDiscardHandler;

impl DiscardHandler<SyncJobKey, SyncJobPayload> for SyncJobDiscardHandler {
    fn discard(
        &self,
        reason: ractor::factory::discard::DiscardReason,
        job: &mut ractor::factory::Job<SyncJobKey, SyncJobPayload>,
    ) {
        warn!("Discarding job {:?} ({:?}) for reason: {:?}", job.key, job.msg, reason);
    }
}

pub type SyncFactory = Factory<
    SyncJobKey,
    SyncJobPayload,
    SyncWorkerContext,
    SyncWorker,
    routing::StickyQueuerRouting<SyncJobKey, SyncJobPayload>, // same user, same worker
    queues::DefaultQueue<SyncJobKey, SyncJobPayload>,
>;

pub type SyncFactoryRef = ActorRef<FactoryMessage<SyncJobKey, SyncJobPayload>>;

/// Spawns the sync worker factory
pub async fn spawn_sync_factory(config: SyncFactoryConfig, context: SyncWorkerContext) -> Result<SyncFactoryRef> {
    info!("Spawning sync factory with {} initial workers", config.num_initial_workers);

    let queue = queues::DefaultQueue::<SyncJobKey, SyncJobPayload>::default();
    let router = routing::StickyQueuerRouting::<SyncJobKey, SyncJobPayload>::default();
    let worker_builder = SyncWorkerBuilder::new(context);

    let dead_mans_switch = ractor::factory::DeadMansSwitchConfiguration {
        detection_timeout: std::time::Duration::from_secs(config.dead_mans_switch_timeout_seconds),
        kill_worker: true,
    };

    let factory_args = FactoryArguments::builder()
        .worker_builder(Box::new(worker_builder))
        .queue(queue)
        .router(router)
        .num_initial_workers(config.num_initial_workers)
        .discard_handler(Arc::new(SyncJobDiscardHandler))
        .dead_mans_switch(dead_mans_switch)
        .build();

    match Actor::spawn(None, SyncFactory::default(), factory_args).await {
        Ok((actor_ref, _actor_handle)) => {
            info!("Sync factory spawned successfully");
            Ok(actor_ref)
        }
        Err(spawn_err) => {
            error!("Failed to spawn sync factory: {:?}", spawn_err);
            Err(anyhow::anyhow!("Failed to spawn factory: {:?}", spawn_err))
        }
    }
}

/// Queue a job for `user_id`
pub fn submit_job(factory: &SyncFactoryRef, user_id: &str, payload: SyncJobPayload) -> Result<()> {
    let job = ractor::factory::Job {
        key: SyncJobKey {
            user_id: user_id.to_string(),
        },
        msg: payload,
        options: Default::default(),
        accepted: None,
    };

    factory
        .send_message(FactoryMessage::Dispatch(job))
        .map_err(|e| anyhow::anyhow!("Failed to dispatch job for {}: {:?}", user_id, e))?;

    Ok(())
}
