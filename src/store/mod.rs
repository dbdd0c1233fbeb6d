//! Storage contract for the sync core.
//!
//! Collectors only need idempotent batch upserts keyed on a set of columns,
//! plus a bulk column update for re-keying network stars.

pub mod memory;
pub mod surreal;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
pub use crate::models::Table;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

pub type Row = Map<String, Value>;

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Insert-or-update every row, matching existing rows on `conflict_keys`
    async fn upsert(&self, table: Table, rows: Vec<Row>, conflict_keys: &[&str]) -> Result<()>;

    /// Merge `patch` into every row whose `column` equals `value`.
    /// Returns the number of rows touched.
    async fn update_where(&self, table: Table, column: &str, value: Value, patch: Row) -> Result<u64>;

    /// Any one row whose `column` equals `value`
    async fn first_where(&self, table: Table, column: &str, value: Value) -> Result<Option<Row>>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A typed row bound to its table and conflict key
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: Table;
    const CONFLICT_KEYS: &'static [&'static str];
}

/// Serialize `records` and upsert them as one batch. Empty batches are skipped.
pub async fn upsert_records<R: Record>(store: &dyn SyncStore, records: &[R]) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let rows = records
        .iter()
        .map(to_row)
        .collect::<Result<Vec<Row>>>()?;

    store.upsert(R::TABLE, rows, R::CONFLICT_KEYS).await?;
    Ok(records.len())
}

pub fn to_row<R: Serialize>(record: &R) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::StoreError(format!(
            "Record did not serialize to an object: {}",
            other
        ))),
    }
}

pub fn from_row<R: DeserializeOwned>(row: Row) -> Result<R> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Stable key built from the conflict columns of `row`, e.g. `u1:12345`
pub fn conflict_key(row: &Row, conflict_keys: &[&str]) -> Result<String> {
    if conflict_keys.is_empty() {
        return Err(SyncError::StoreError("Upsert needs at least one conflict key".to_string()));
    }

    let parts = conflict_keys
        .iter()
        .map(|key| match row.get(*key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(SyncError::StoreError(format!(
                "Row is missing conflict column '{}'",
                key
            ))),
            Some(other) => Ok(other.to_string()),
        })
        .collect::<Result<Vec<String>>>()?;

    Ok(parts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_conflict_key_joins_columns_in_order() {
        let r = row(json!({ "user_id": "u1", "repo_id": 42, "repo_name": "a/b" }));
        assert_eq!(conflict_key(&r, &["user_id", "repo_id"]).unwrap(), "u1:42");
        assert_eq!(conflict_key(&r, &["repo_id", "user_id"]).unwrap(), "42:u1");
    }

    #[test]
    fn test_conflict_key_requires_every_column() {
        let r = row(json!({ "user_id": "u1", "repo_id": null }));
        assert!(matches!(
            conflict_key(&r, &["user_id", "repo_id"]),
            Err(SyncError::StoreError(_))
        ));
        assert!(conflict_key(&r, &[]).is_err());
    }
}
