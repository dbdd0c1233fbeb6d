use async_trait::async_trait;
use deadpool::managed::Object;
use futures::StreamExt;
use serde_json::Value;
use surrealdb::RecordId;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{conflict_key, Row, SyncStore, Table};
use crate::error::{Result, SyncError};
use crate::models::{Account, LinkedAccount};
use crate::pool::{
    create_pool, PoolConfig, SurrealConnection, SurrealConnectionConfig, SurrealConnectionManager,
    SurrealPool,
};

/// SurrealDB-backed store. Each row's record id is built from its conflict
/// columns, so `UPSERT` on that id is the insert-or-update.
#[derive(Clone)]
pub struct SurrealStore {
    pool: SurrealPool,
}

impl SurrealStore {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }

    pub fn connect(connection_config: SurrealConnectionConfig, pool_config: PoolConfig) -> Result<Self> {
        info!("Creating SurrealDB pool for {}", connection_config.url);
        Ok(Self::new(create_pool(connection_config, pool_config)?))
    }

    async fn conn(&self) -> Result<Object<SurrealConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| SyncError::StoreError(format!("Failed to get DB connection: {}", e)))
    }

    /// GitHub accounts with a stored token, for startup syncs
    pub async fn get_github_accounts(&self, limit: usize, offset: usize) -> Result<Vec<Account>> {
        let query = r#"
            SELECT * FROM account
            WHERE providerId = 'github'
            AND access_token != NULL
            ORDER BY id ASC
            LIMIT $limit
            START $offset
        "#;

        let conn = self.conn().await?;
        let mut result = conn
            .db
            .query(query)
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?;

        let accounts: Vec<Account> = result.take(0)?;
        Ok(accounts)
    }

    /// Live query over newly created GitHub accounts
    pub async fn setup_account_live_query(&self) -> Result<mpsc::Receiver<LinkedAccount>> {
        let (tx, rx) = mpsc::channel::<LinkedAccount>(100);

        info!("Setting up live query for new GitHub accounts...");

        let conn = self.conn().await?;
        let stream = conn
            .db
            .query("LIVE SELECT * FROM account")
            .await?
            .stream::<surrealdb::Notification<Account>>(0)?;

        tokio::spawn(async move {
            futures::pin_mut!(stream);
            while let Some(result) = stream.next().await {
                match result {
                    Ok(notification) => {
                        if !matches!(notification.action, surrealdb::Action::Create) {
                            continue;
                        }
                        let account = notification.data;
                        if account.provider_id != "github" {
                            continue;
                        }
                        if tx.send(LinkedAccount::from_account(account, true)).await.is_err() {
                            warn!("Account receiver dropped, ending live query");
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error in account live stream: {}", e);
                        break;
                    }
                }
            }
            info!("Account live query stream ended");
        });

        Ok(rx)
    }

    async fn upsert_row(conn: &SurrealConnection, id: RecordId, row: Row) -> Result<()> {
        conn.db
            .query("UPSERT $id MERGE $data")
            .bind(("id", id))
            .bind(("data", Value::Object(row)))
            .await?
            .check()?;
        Ok(())
    }
}

fn checked_column(column: &str) -> Result<&str> {
    if !column.is_empty() && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(column)
    } else {
        Err(SyncError::StoreError(format!("Invalid column name: {}", column)))
    }
}

#[async_trait]
impl SyncStore for SurrealStore {
    async fn upsert(&self, table: Table, rows: Vec<Row>, conflict_keys: &[&str]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        debug!(table = %table, rows = rows.len(), "Upserting batch");

        let conn = self.conn().await?;
        for row in rows {
            let id = RecordId::from((table.name(), conflict_key(&row, conflict_keys)?));
            Self::upsert_row(&conn, id, row).await?;
        }
        Ok(())
    }

    async fn update_where(&self, table: Table, column: &str, value: Value, patch: Row) -> Result<u64> {
        let column = checked_column(column)?;
        // Project the matched column only; record ids do not map onto JSON
        let query = format!(
            "UPDATE {} MERGE $patch WHERE {} = $value RETURN {}",
            table.name(),
            column,
            column
        );

        let conn = self.conn().await?;
        let mut result = conn
            .db
            .query(query)
            .bind(("patch", Value::Object(patch)))
            .bind(("value", value))
            .await?;

        let updated: Vec<Value> = result.take(0)?;
        Ok(updated.len() as u64)
    }

    async fn first_where(&self, table: Table, column: &str, value: Value) -> Result<Option<Row>> {
        let query = format!(
            "SELECT * OMIT id FROM {} WHERE {} = $value LIMIT 1",
            table.name(),
            checked_column(column)?
        );

        let conn = self.conn().await?;
        let mut result = conn.db.query(query).bind(("value", value)).await?;

        let rows: Vec<Value> = result.take(0)?;
        Ok(rows.into_iter().find_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        }))
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.db.query("SELECT 1").await?.check()?;
        Ok(())
    }
}
