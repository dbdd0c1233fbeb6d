use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::config::{SyncConfig, DEFAULT_API_BASE_URL, DEFAULT_FOLLOW_LIMIT, MAX_PER_PAGE};
use crate::pool::{PoolConfig, SurrealConnectionConfig, LOCAL_DB_URL};

#[derive(Parser)]
#[command(name = "github-account-sync")]
#[command(about = "Imports GitHub stars, follows, followers, languages and network stars for app users")]
#[command(version)]
pub struct Cli {
    /// SurrealDB connection URL
    #[arg(long, env = "DB_URL", default_value = "ws://localhost:8000", global = true)]
    pub db_url: String,

    /// SurrealDB username
    #[arg(long, env = "DB_USER", default_value = "root", global = true)]
    pub db_user: String,

    /// SurrealDB password
    #[arg(long, env = "DB_PASS", default_value = "root", global = true)]
    pub db_pass: String,

    /// SurrealDB namespace
    #[arg(long, env = "DB_NAMESPACE", default_value = "gitfeed", global = true)]
    pub db_namespace: String,

    /// SurrealDB database
    #[arg(long, env = "DB_DATABASE", default_value = "github", global = true)]
    pub db_database: String,

    /// Use a local SurrealDB at ws://localhost:8000
    #[arg(long, global = true)]
    pub local: bool,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value_t = 10, global = true)]
    pub db_pool_max_size: usize,

    /// Seconds to wait for a new database connection
    #[arg(long, env = "DB_CONNECTION_TIMEOUT", default_value_t = 30, global = true)]
    pub db_connection_timeout: u64,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE_URL, global = true)]
    pub github_api_url: String,

    /// Followed users visited when collecting network stars
    #[arg(long, env = "FOLLOW_LIMIT", default_value_t = DEFAULT_FOLLOW_LIMIT, global = true)]
    pub follow_limit: usize,

    /// Items per GitHub page (1-100)
    #[arg(long, env = "PER_PAGE", default_value_t = MAX_PER_PAGE, global = true)]
    pub per_page: u32,

    /// Abort a whole account sync after this many seconds
    #[arg(long, env = "SYNC_TIMEOUT_SECS", global = true)]
    pub sync_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync one user's GitHub data and print the report
    Sync {
        /// App user id the rows are stored under
        #[arg(long)]
        user_id: String,

        /// GitHub OAuth access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Keep rows in memory instead of writing to SurrealDB
        #[arg(long)]
        dry_run: bool,
    },
    /// Hand network stars of a followed GitHub user to their new app account
    Merge {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        github_user_id: i64,
    },
    /// Sync linked accounts continuously and serve health/admin endpoints
    Serve {
        /// HTTP port
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,

        /// Initial sync workers
        #[arg(long, env = "SYNC_WORKERS", default_value_t = 4)]
        workers: usize,

        /// Bearer key for /admin; admin routes are off without it
        #[arg(long, env = "ADMIN_API_KEY", hide_env_values = true)]
        admin_api_key: Option<String>,
    },
}

impl Cli {
    pub fn connection_config(&self) -> SurrealConnectionConfig {
        SurrealConnectionConfig {
            url: if self.local {
                LOCAL_DB_URL.to_string()
            } else {
                self.db_url.clone()
            },
            username: self.db_user.clone(),
            password: self.db_pass.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_size: self.db_pool_max_size,
            connection_timeout: Duration::from_secs(self.db_connection_timeout),
            ..Default::default()
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_api_base_url(self.github_api_url.clone())
            .with_per_page(self.per_page)
            .with_follow_limit(self.follow_limit)
            .with_sync_timeout(self.sync_timeout_secs.map(Duration::from_secs))
    }
}
