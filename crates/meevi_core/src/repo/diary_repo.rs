//! Diary entry persistence.

use super::{
    ensure_tables, lookup_dog_owner, lookup_row_owner, not_found, parse_id, DogRecordTable,
    OwnerLookup, RepoError, RepoResult,
};
use crate::model::care::{DiaryEntry, DiaryKind};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const DIARY_SELECT_SQL: &str =
    "SELECT id, dog_id, kind, title, notes, occurred_at FROM diary_entries";
const DIARY_DEFAULT_LIMIT: u32 = 20;
const DIARY_LIMIT_MAX: u32 = 200;

/// Query options for diary timelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiaryListQuery {
    pub kind: Option<DiaryKind>,
    /// Defaults to 20 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait DiaryRepository: OwnerLookup {
    fn create_entry(&self, entry: &DiaryEntry) -> RepoResult<RecordId>;
    fn update_entry(&self, entry: &DiaryEntry) -> RepoResult<()>;
    fn get_entry(&self, id: RecordId) -> RepoResult<Option<DiaryEntry>>;
    fn list_entries(
        &self,
        dog_id: RecordId,
        query: &DiaryListQuery,
    ) -> RepoResult<Vec<DiaryEntry>>;
    fn delete_entry(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqliteDiaryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDiaryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["dogs", "diary_entries"])?;
        Ok(Self { conn })
    }
}

impl OwnerLookup for SqliteDiaryRepository<'_> {
    fn owner_of_dog(&self, dog_id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_dog_owner(self.conn, dog_id)
    }

    fn owner_of_row(&self, table: DogRecordTable, id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_row_owner(self.conn, table, id)
    }
}

impl DiaryRepository for SqliteDiaryRepository<'_> {
    fn create_entry(&self, entry: &DiaryEntry) -> RepoResult<RecordId> {
        entry.validate()?;
        self.conn.execute(
            "INSERT INTO diary_entries (id, dog_id, kind, title, notes, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.id.to_string(),
                entry.dog_id.to_string(),
                entry.kind.as_str(),
                entry.title.as_str(),
                entry.notes.as_deref(),
                entry.occurred_at,
            ],
        )?;
        Ok(entry.id)
    }

    fn update_entry(&self, entry: &DiaryEntry) -> RepoResult<()> {
        entry.validate()?;
        let changed = self.conn.execute(
            "UPDATE diary_entries
             SET kind = ?1, title = ?2, notes = ?3, occurred_at = ?4
             WHERE id = ?5;",
            params![
                entry.kind.as_str(),
                entry.title.as_str(),
                entry.notes.as_deref(),
                entry.occurred_at,
                entry.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("diary entry", entry.id));
        }
        Ok(())
    }

    fn get_entry(&self, id: RecordId) -> RepoResult<Option<DiaryEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DIARY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_diary_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_entries(
        &self,
        dog_id: RecordId,
        query: &DiaryListQuery,
    ) -> RepoResult<Vec<DiaryEntry>> {
        let mut sql = format!("{DIARY_SELECT_SQL} WHERE dog_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(dog_id.to_string())];

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY occurred_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_diary_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_diary_row(row)?);
        }
        Ok(entries)
    }

    fn delete_entry(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM diary_entries WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found("diary entry", id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to the diary contract.
pub fn normalize_diary_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => DIARY_DEFAULT_LIMIT,
        Some(value) if value > DIARY_LIMIT_MAX => DIARY_LIMIT_MAX,
        Some(value) => value,
    }
}

fn parse_diary_row(row: &Row<'_>) -> RepoResult<DiaryEntry> {
    let id_text: String = row.get("id")?;
    let dog_text: String = row.get("dog_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = DiaryKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid diary kind `{kind_text}` in diary_entries.kind"
        ))
    })?;
    Ok(DiaryEntry {
        id: parse_id(&id_text, "diary_entries.id")?,
        dog_id: parse_id(&dog_text, "diary_entries.dog_id")?,
        kind,
        title: row.get("title")?,
        notes: row.get("notes")?,
        occurred_at: row.get("occurred_at")?,
    })
}
