use deadpool::{managed, Runtime};
use std::time::Duration;
use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::SyncError;

pub const LOCAL_DB_URL: &str = "ws://localhost:8000";

#[derive(Debug, Clone)]
pub struct SurrealConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

/// A signed-in SurrealDB session with namespace and database selected
#[derive(Clone, Debug)]
pub struct SurrealConnection {
    pub db: Surreal<Any>,
}

#[derive(Debug)]
pub struct SurrealConnectionManager {
    config: SurrealConnectionConfig,
}

impl SurrealConnectionManager {
    pub fn new(config: SurrealConnectionConfig) -> Self {
        Self { config }
    }
}

impl managed::Manager for SurrealConnectionManager {
    type Type = SurrealConnection;
    type Error = SyncError;

    async fn create(&self) -> Result<SurrealConnection, SyncError> {
        debug!(url = %self.config.url, "Opening SurrealDB connection");
        let db = connect(&self.config.url).await?;

        db.signin(Root {
            username: &self.config.username,
            password: &self.config.password,
        })
        .await?;
        db.use_ns(&self.config.namespace).use_db(&self.config.database).await?;

        Ok(SurrealConnection { db })
    }

    async fn recycle(&self, conn: &mut SurrealConnection, _: &managed::Metrics) -> managed::RecycleResult<SyncError> {
        conn.db
            .health()
            .await
            .map_err(|e| managed::RecycleError::Backend(SyncError::DatabaseError(e)))
    }
}

pub type SurrealPool = managed::Pool<SurrealConnectionManager>;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
    /// Upper bound on waiting for a free connection
    pub wait_timeout: Option<Duration>,
    pub connection_timeout: Duration,
    pub recycle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            wait_timeout: Some(Duration::from_secs(30)),
            connection_timeout: Duration::from_secs(30),
            recycle_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Build the pool; connections are opened lazily on first checkout
pub fn create_pool(connection_config: SurrealConnectionConfig, pool_config: PoolConfig) -> Result<SurrealPool, SyncError> {
    managed::Pool::builder(SurrealConnectionManager::new(connection_config))
        .max_size(pool_config.max_size)
        .runtime(Runtime::Tokio1)
        .wait_timeout(pool_config.wait_timeout)
        .create_timeout(Some(pool_config.connection_timeout))
        .recycle_timeout(pool_config.recycle_timeout)
        .build()
        .map_err(|e| SyncError::ConfigError(format!("Failed to create connection pool: {}", e)))
}
