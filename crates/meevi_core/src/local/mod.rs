//! Local-only document collections.
//!
//! # Responsibility
//! - Persist calendar events, emergency contacts and dog documents as JSON
//!   bodies in `local_items`, scoped by owner.
//! - Expose raw rows to cloud sync.
//!
//! # Invariants
//! - Every stored body deserializes into its collection's record type and
//!   passes that type's validation.
//! - `replace_*` swaps a whole collection inside one transaction.

use crate::clock::now_epoch_ms;
use crate::model::calendar::CalendarEvent;
use crate::model::essentials::{DogDocument, EmergencyContact};
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use crate::repo::{ensure_tables, parse_id, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Named local collection with its remote table counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalCollection {
    CalendarEvents,
    EmergencyContacts,
    DogDocuments,
}

impl LocalCollection {
    pub const ALL: [LocalCollection; 3] = [
        Self::CalendarEvents,
        Self::EmergencyContacts,
        Self::DogDocuments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CalendarEvents => "calendar_events",
            Self::EmergencyContacts => "emergency_contacts",
            Self::DogDocuments => "dog_documents",
        }
    }

    /// Table name on the hosted platform.
    pub fn remote_table(self) -> &'static str {
        match self {
            Self::CalendarEvents => "calendar_events",
            Self::EmergencyContacts => "emergency_contacts",
            Self::DogDocuments => "dog_documents",
        }
    }

    /// Checks one raw body against the collection's record type and returns its id.
    pub fn check_row(self, body: &Value) -> RepoResult<RecordId> {
        match self {
            Self::CalendarEvents => typed_id::<CalendarEvent>(body),
            Self::EmergencyContacts => typed_id::<EmergencyContact>(body),
            Self::DogDocuments => typed_id::<DogDocument>(body),
        }
    }
}

/// Record type stored in a local collection.
pub trait LocalItem: Serialize + DeserializeOwned {
    const COLLECTION: LocalCollection;

    fn item_id(&self) -> RecordId;
    fn validate_item(&self) -> Result<(), ValidationError>;
}

impl LocalItem for CalendarEvent {
    const COLLECTION: LocalCollection = LocalCollection::CalendarEvents;

    fn item_id(&self) -> RecordId {
        self.id
    }

    fn validate_item(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl LocalItem for EmergencyContact {
    const COLLECTION: LocalCollection = LocalCollection::EmergencyContacts;

    fn item_id(&self) -> RecordId {
        self.id
    }

    fn validate_item(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl LocalItem for DogDocument {
    const COLLECTION: LocalCollection = LocalCollection::DogDocuments;

    fn item_id(&self) -> RecordId {
        self.id
    }

    fn validate_item(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

fn typed_id<T: LocalItem>(body: &Value) -> RepoResult<RecordId> {
    let item: T = serde_json::from_value(body.clone()).map_err(|err| {
        RepoError::InvalidData(format!("invalid {} row: {err}", T::COLLECTION.as_str()))
    })?;
    item.validate_item()?;
    Ok(item.item_id())
}

pub struct LocalStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LocalStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["local_items"])?;
        Ok(Self { conn })
    }

    /// Inserts or replaces one item.
    pub fn put<T: LocalItem>(&self, owner_id: RecordId, item: &T) -> RepoResult<()> {
        item.validate_item()?;
        let body = encode(item)?;
        self.conn.execute(
            "INSERT INTO local_items (collection, owner_id, item_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (collection, owner_id, item_id)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at;",
            params![
                T::COLLECTION.as_str(),
                owner_id.to_string(),
                item.item_id().to_string(),
                body,
                now_epoch_ms(),
            ],
        )?;
        Ok(())
    }

    pub fn get<T: LocalItem>(&self, owner_id: RecordId, id: RecordId) -> RepoResult<Option<T>> {
        let body = self
            .conn
            .query_row(
                "SELECT body FROM local_items
                 WHERE collection = ?1 AND owner_id = ?2 AND item_id = ?3;",
                params![T::COLLECTION.as_str(), owner_id.to_string(), id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        body.map(|text| decode::<T>(&text)).transpose()
    }

    /// Lists items in insertion-independent order (by item id).
    pub fn list<T: LocalItem>(&self, owner_id: RecordId) -> RepoResult<Vec<T>> {
        self.bodies(T::COLLECTION, owner_id)?
            .iter()
            .map(|(_, text)| decode::<T>(text))
            .collect()
    }

    pub fn delete<T: LocalItem>(&self, owner_id: RecordId, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM local_items
             WHERE collection = ?1 AND owner_id = ?2 AND item_id = ?3;",
            params![T::COLLECTION.as_str(), owner_id.to_string(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: T::COLLECTION.as_str(),
                id,
            });
        }
        Ok(())
    }

    /// Replaces the owner's whole collection with `items`.
    pub fn replace_all<T: LocalItem>(&self, owner_id: RecordId, items: &[T]) -> RepoResult<()> {
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            item.validate_item()?;
            rows.push((item.item_id(), encode(item)?));
        }
        self.write_collection(T::COLLECTION, owner_id, &rows)
    }

    /// Raw JSON bodies for sync.
    pub fn list_raw(&self, collection: LocalCollection, owner_id: RecordId) -> RepoResult<Vec<Value>> {
        self.bodies(collection, owner_id)?
            .iter()
            .map(|(item_id, text)| {
                serde_json::from_str(text).map_err(|err| {
                    RepoError::InvalidData(format!(
                        "local_items body for {} {item_id} is not JSON: {err}",
                        collection.as_str()
                    ))
                })
            })
            .collect()
    }

    /// Replaces a collection from raw bodies, rejecting the batch if any row is invalid.
    pub fn replace_raw(
        &self,
        collection: LocalCollection,
        owner_id: RecordId,
        bodies: &[Value],
    ) -> RepoResult<()> {
        let mut rows = Vec::with_capacity(bodies.len());
        for body in bodies {
            let id = collection.check_row(body)?;
            rows.push((id, body.to_string()));
        }
        self.write_collection(collection, owner_id, &rows)
    }

    fn bodies(
        &self,
        collection: LocalCollection,
        owner_id: RecordId,
    ) -> RepoResult<Vec<(RecordId, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, body FROM local_items
             WHERE collection = ?1 AND owner_id = ?2
             ORDER BY item_id ASC;",
        )?;
        let mut rows = stmt.query(params![collection.as_str(), owner_id.to_string()])?;
        let mut bodies = Vec::new();
        while let Some(row) = rows.next()? {
            let item_id: String = row.get(0)?;
            bodies.push((parse_id(&item_id, "local_items.item_id")?, row.get(1)?));
        }
        Ok(bodies)
    }

    fn write_collection(
        &self,
        collection: LocalCollection,
        owner_id: RecordId,
        rows: &[(RecordId, String)],
    ) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM local_items WHERE collection = ?1 AND owner_id = ?2;",
            params![collection.as_str(), owner_id.to_string()],
        )?;
        let updated_at = now_epoch_ms();
        {
            let mut insert = tx.prepare(
                "INSERT INTO local_items (collection, owner_id, item_id, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (item_id, body) in rows {
                insert.execute(params![
                    collection.as_str(),
                    owner_id.to_string(),
                    item_id.to_string(),
                    body,
                    updated_at,
                ])?;
            }
        }
        tx.commit()?;
        debug!(
            "event=local_replace module=local status=ok collection={} rows={}",
            collection.as_str(),
            rows.len()
        );
        Ok(())
    }
}

fn encode<T: Serialize>(item: &T) -> RepoResult<String> {
    serde_json::to_string(item)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode local item: {err}")))
}

fn decode<T: LocalItem>(text: &str) -> RepoResult<T> {
    let item: T = serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("invalid {} body: {err}", T::COLLECTION.as_str()))
    })?;
    item.validate_item()?;
    Ok(item)
}
