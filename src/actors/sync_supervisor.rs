use crate::actors::sync_factory::{spawn_sync_factory, submit_job, SyncFactoryConfig, SyncFactoryRef};
use crate::actors::sync_worker::{
    SyncCounters, SyncCountersSnapshot, SyncJobKey, SyncJobPayload, SyncWorkerContext,
};
use crate::models::LinkedAccount;
use crate::store::SurrealStore;
use crate::sync::SyncCoordinator;
use ractor::{factory::FactoryMessage, Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

const EXISTING_ACCOUNTS_BATCH: usize = 100;

/// Turns linked GitHub accounts into sync jobs
pub struct SyncSupervisor;

pub struct SyncSupervisorState {
    factory: SyncFactoryRef,
    counters: Arc<SyncCounters>,
    accounts_received: u64,
}

#[derive(Debug)]
pub enum SyncSupervisorMessage {
    /// A GitHub account is linked to an app user
    AccountLinked(LinkedAccount),
    /// Sync one user on demand
    SyncUser { user_id: String, access_token: String },
    GetStats(RpcReplyPort<SyncStats>),
    Shutdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub accounts_received: u64,
    #[serde(flatten)]
    pub counters: SyncCountersSnapshot,
    pub factory_queue_depth: usize,
    pub factory_active_workers: usize,
}

pub struct SyncSupervisorArgs {
    pub coordinator: Arc<SyncCoordinator>,
    pub factory_config: SyncFactoryConfig,
    /// Linked-account feed forwarded to this actor, if any
    pub account_receiver: Option<mpsc::Receiver<LinkedAccount>>,
}

impl SyncSupervisor {
    pub async fn spawn(args: SyncSupervisorArgs) -> Result<ActorRef<SyncSupervisorMessage>, SpawnErr> {
        let (actor_ref, _handle) = Actor::spawn(None, SyncSupervisor, args).await?;
        Ok(actor_ref)
    }

    /// Spawn the supervisor fed by the account table: existing GitHub
    /// accounts are synced once, new ones as they are created.
    pub async fn spawn_with_live_query(
        store: Arc<SurrealStore>,
        coordinator: Arc<SyncCoordinator>,
        factory_config: SyncFactoryConfig,
    ) -> Result<ActorRef<SyncSupervisorMessage>, SpawnErr> {
        let account_receiver = store
            .setup_account_live_query()
            .await
            .map_err(|e| SpawnErr::StartupFailed(e.to_string().into()))?;

        let supervisor = Self::spawn(SyncSupervisorArgs {
            coordinator,
            factory_config,
            account_receiver: Some(account_receiver),
        })
        .await?;

        let myself = supervisor.clone();
        tokio::spawn(async move {
            let mut offset = 0;
            let mut total = 0;
            loop {
                match store.get_github_accounts(EXISTING_ACCOUNTS_BATCH, offset).await {
                    Ok(accounts) if accounts.is_empty() => break,
                    Ok(accounts) => {
                        offset += accounts.len();
                        for account in accounts {
                            let linked = LinkedAccount::from_account(account, false);
                            if let Err(e) = myself.send_message(SyncSupervisorMessage::AccountLinked(linked)) {
                                error!("Failed to queue existing account: {}", e);
                                return;
                            }
                            total += 1;
                        }
                    }
                    Err(e) => {
                        error!("Failed to fetch existing accounts: {}", e);
                        break;
                    }
                }
            }
            info!("Queued {} existing GitHub accounts", total);
        });

        info!("Sync supervisor started with live query integration");
        Ok(supervisor)
    }

    async fn factory_count(
        factory: &SyncFactoryRef,
        msg: fn(RpcReplyPort<usize>) -> FactoryMessage<SyncJobKey, SyncJobPayload>,
    ) -> usize {
        match factory.call(msg, Some(Duration::from_secs(5))).await {
            Ok(ractor::rpc::CallResult::Success(count)) => count,
            _ => 0,
        }
    }
}

#[ractor::async_trait]
impl Actor for SyncSupervisor {
    type Msg = SyncSupervisorMessage;
    type State = SyncSupervisorState;
    type Arguments = SyncSupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("Starting sync supervisor");

        let counters = Arc::new(SyncCounters::default());
        let context = SyncWorkerContext {
            coordinator: args.coordinator,
            counters: counters.clone(),
        };

        let factory = spawn_sync_factory(args.factory_config, context)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn factory: {}", e)))?;

        if let Some(mut receiver) = args.account_receiver {
            let myself = myself.clone();
            tokio::spawn(async move {
                while let Some(account) = receiver.recv().await {
                    if let Err(e) = myself.send_message(SyncSupervisorMessage::AccountLinked(account)) {
                        error!("Failed to forward linked account: {}", e);
                        break;
                    }
                }
                info!("Account feed ended");
            });
        }

        Ok(SyncSupervisorState {
            factory,
            counters,
            accounts_received: 0,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SyncSupervisorMessage::AccountLinked(account) => {
                state.accounts_received += 1;
                info!(user_id = %account.user_id, is_new = account.is_new, "GitHub account linked");

                // Network stars collected before this user registered become theirs
                if account.is_new {
                    if let Some(github_user_id) = account.github_user_id {
                        if let Err(e) = submit_job(
                            &state.factory,
                            &account.user_id,
                            SyncJobPayload::MergeNetworkStars { github_user_id },
                        ) {
                            error!("{}", e);
                        }
                    }
                }

                if let Err(e) = submit_job(
                    &state.factory,
                    &account.user_id,
                    SyncJobPayload::SyncAccount {
                        access_token: account.access_token,
                    },
                ) {
                    error!("{}", e);
                }
            }

            SyncSupervisorMessage::SyncUser { user_id, access_token } => {
                info!(user_id = %user_id, "Sync requested");
                if let Err(e) = submit_job(&state.factory, &user_id, SyncJobPayload::SyncAccount { access_token }) {
                    error!("{}", e);
                }
            }

            SyncSupervisorMessage::GetStats(reply) => {
                let stats = SyncStats {
                    accounts_received: state.accounts_received,
                    counters: state.counters.snapshot(),
                    factory_queue_depth: Self::factory_count(&state.factory, FactoryMessage::GetQueueDepth).await,
                    factory_active_workers: Self::factory_count(&state.factory, FactoryMessage::GetNumActiveWorkers)
                        .await,
                };

                if !reply.is_closed() {
                    let _ = reply.send(stats);
                }
            }

            SyncSupervisorMessage::Shutdown => {
                info!("Shutting down sync supervisor");

                state
                    .factory
                    .send_message(FactoryMessage::DrainRequests)
                    .map_err(|e| ActorProcessingErr::from(format!("Failed to drain factory: {:?}", e)))?;

                myself.stop(Some("Shutdown requested".to_string()));
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        info!(
            accounts_received = state.accounts_received,
            counters = ?state.counters.snapshot(),
            "Sync supervisor stopped"
        );
        Ok(())
    }
}
