use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{conflict_key, from_row, Row, SyncStore, Table};
use crate::error::{Result, SyncError};

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<String, Row>>,
    upsert_calls: HashMap<Table, usize>,
}

/// In-process store with the same upsert semantics as the database adapter
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|_| SyncError::StoreError("Memory store lock poisoned".to_string()))
    }

    /// Rows of `table` ordered by conflict key
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.lock()
            .map(|t| t.rows.get(&table).map(|r| r.values().cloned().collect()).unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn records<R: DeserializeOwned>(&self, table: Table) -> Result<Vec<R>> {
        self.rows(table).into_iter().map(from_row).collect()
    }

    pub fn count(&self, table: Table) -> usize {
        self.lock()
            .map(|t| t.rows.get(&table).map(|r| r.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of `upsert` batches received for `table`
    pub fn upsert_calls(&self, table: Table) -> usize {
        self.lock()
            .map(|t| t.upsert_calls.get(&table).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn upsert(&self, table: Table, rows: Vec<Row>, conflict_keys: &[&str]) -> Result<()> {
        let keyed = rows
            .into_iter()
            .map(|row| conflict_key(&row, conflict_keys).map(|key| (key, row)))
            .collect::<Result<Vec<_>>>()?;

        let mut tables = self.lock()?;
        *tables.upsert_calls.entry(table).or_insert(0) += 1;

        let existing = tables.rows.entry(table).or_default();
        for (key, row) in keyed {
            existing.entry(key).or_default().extend(row);
        }
        Ok(())
    }

    async fn update_where(&self, table: Table, column: &str, value: Value, patch: Row) -> Result<u64> {
        let mut tables = self.lock()?;
        let mut updated = 0;
        if let Some(rows) = tables.rows.get_mut(&table) {
            for row in rows.values_mut().filter(|row| row.get(column) == Some(&value)) {
                row.extend(patch.clone());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn first_where(&self, table: Table, column: &str, value: Value) -> Result<Option<Row>> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(&table)
            .and_then(|rows| rows.values().find(|row| row.get(column) == Some(&value)).cloned()))
    }
}
