//! Remote row stores.
//!
//! Rows are JSON objects keyed by their `id` field, scoped by table and owner.

use crate::clock::now_epoch_ms;
use crate::model::RecordId;
use crate::repo::{ensure_tables, RepoResult};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub enum RemoteError {
    /// Store cannot be reached or its state lock is poisoned.
    Unavailable(String),
    /// A row was refused (for example it has no string `id`).
    Rejected(String),
    Storage(rusqlite::Error),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "remote store unavailable: {message}"),
            Self::Rejected(message) => write!(f, "remote store rejected row: {message}"),
            Self::Storage(err) => write!(f, "remote storage error: {err}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value)
    }
}

impl<T> From<PoisonError<T>> for RemoteError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Unavailable("state lock poisoned".to_string())
    }
}

/// Hosted row storage seen by sync.
pub trait RemoteStore {
    /// Inserts or replaces rows by id; returns how many rows were written.
    fn upsert_rows(&self, table: &str, owner_id: RecordId, rows: &[Value])
        -> Result<usize, RemoteError>;
    /// Returns the owner's rows in id order.
    fn fetch_rows(&self, table: &str, owner_id: RecordId) -> Result<Vec<Value>, RemoteError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn upsert_rows(
        &self,
        table: &str,
        owner_id: RecordId,
        rows: &[Value],
    ) -> Result<usize, RemoteError> {
        (**self).upsert_rows(table, owner_id, rows)
    }

    fn fetch_rows(&self, table: &str, owner_id: RecordId) -> Result<Vec<Value>, RemoteError> {
        (**self).fetch_rows(table, owner_id)
    }
}

fn row_id(row: &Value) -> Result<&str, RemoteError> {
    row.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RemoteError::Rejected("row has no string `id` field".to_string()))
}

type TableKey = (String, RecordId);

/// Process-local store used by tests and offline demos.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    tables: Mutex<BTreeMap<TableKey, BTreeMap<String, Value>>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn upsert_rows(
        &self,
        table: &str,
        owner_id: RecordId,
        rows: &[Value],
    ) -> Result<usize, RemoteError> {
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            keyed.push((row_id(row)?.to_string(), row.clone()));
        }
        let mut tables = self.tables.lock()?;
        let stored = tables.entry((table.to_string(), owner_id)).or_default();
        let written = keyed.len();
        stored.extend(keyed);
        Ok(written)
    }

    fn fetch_rows(&self, table: &str, owner_id: RecordId) -> Result<Vec<Value>, RemoteError> {
        let tables = self.tables.lock()?;
        Ok(tables
            .get(&(table.to_string(), owner_id))
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// Store backed by the `remote_rows` table of a separate SQLite database.
pub struct SqliteRemoteStore {
    conn: Mutex<Connection>,
}

impl SqliteRemoteStore {
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_tables(&conn, &["remote_rows"])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RemoteStore for SqliteRemoteStore {
    fn upsert_rows(
        &self,
        table: &str,
        owner_id: RecordId,
        rows: &[Value],
    ) -> Result<usize, RemoteError> {
        let conn = self.conn.lock()?;
        let tx = conn.unchecked_transaction()?;
        let updated_at = now_epoch_ms();
        {
            let mut upsert = tx.prepare(
                "INSERT INTO remote_rows (table_name, owner_id, row_id, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (table_name, owner_id, row_id)
                 DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at;",
            )?;
            for row in rows {
                upsert.execute(params![
                    table,
                    owner_id.to_string(),
                    row_id(row)?,
                    row.to_string(),
                    updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn fetch_rows(&self, table: &str, owner_id: RecordId) -> Result<Vec<Value>, RemoteError> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT row_id, body FROM remote_rows
             WHERE table_name = ?1 AND owner_id = ?2
             ORDER BY row_id ASC;",
        )?;
        let mut rows = stmt.query(params![table, owner_id.to_string()])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let body: String = row.get(1)?;
            let value = serde_json::from_str(&body).map_err(|err| {
                RemoteError::Rejected(format!("stored row {id} in {table} is not JSON: {err}"))
            })?;
            values.push(value);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryRemoteStore, RemoteError, RemoteStore};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn memory_store_upserts_by_id_and_scopes_by_owner() {
        let store = MemoryRemoteStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        store
            .upsert_rows("t", owner, &[json!({"id": "b", "v": 1}), json!({"id": "a", "v": 1})])
            .unwrap();
        store
            .upsert_rows("t", owner, &[json!({"id": "b", "v": 2})])
            .unwrap();

        let rows = store.fetch_rows("t", owner).unwrap();
        assert_eq!(rows, vec![json!({"id": "a", "v": 1}), json!({"id": "b", "v": 2})]);
        assert!(store.fetch_rows("t", other).unwrap().is_empty());
    }

    #[test]
    fn rows_without_id_are_rejected() {
        let store = MemoryRemoteStore::new();
        let err = store
            .upsert_rows("t", Uuid::new_v4(), &[json!({"v": 1})])
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
    }
}
