//! Repository layer: one data-access contract per record type.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths call the record's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Update/delete of a missing row returns `RepoError::NotFound`.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod care_repo;
pub mod diary_repo;
pub mod dog_repo;
pub mod notification_repo;
pub mod owner_repo;
pub mod preferences_repo;
pub mod vaccine_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: RecordId,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Dog-scoped tables; their rows belong to whoever owns the dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogRecordTable {
    Feeding,
    Baths,
    Exercise,
    Diary,
    Vaccines,
}

impl DogRecordTable {
    fn sql_name(self) -> &'static str {
        match self {
            Self::Feeding => "feeding_records",
            Self::Baths => "bath_records",
            Self::Exercise => "exercise_records",
            Self::Diary => "diary_entries",
            Self::Vaccines => "vaccine_records",
        }
    }
}

/// Resolves the owning account of dog-scoped rows so services can route change events.
pub trait OwnerLookup {
    /// `None` when the dog does not exist.
    fn owner_of_dog(&self, dog_id: RecordId) -> RepoResult<Option<RecordId>>;
    /// `None` when the row does not exist.
    fn owner_of_row(&self, table: DogRecordTable, id: RecordId) -> RepoResult<Option<RecordId>>;
}

pub(crate) fn lookup_dog_owner(conn: &Connection, dog_id: RecordId) -> RepoResult<Option<RecordId>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT owner_id FROM dogs WHERE id = ?1;",
            [dog_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|value| parse_id(&value, "dogs.owner_id")).transpose()
}

pub(crate) fn lookup_row_owner(
    conn: &Connection,
    table: DogRecordTable,
    id: RecordId,
) -> RepoResult<Option<RecordId>> {
    let sql = format!(
        "SELECT d.owner_id FROM {} r JOIN dogs d ON d.id = r.dog_id WHERE r.id = ?1;",
        table.sql_name()
    );
    let raw: Option<String> = conn
        .query_row(&sql, [id.to_string()], |row| row.get(0))
        .optional()?;
    raw.map(|value| parse_id(&value, "dogs.owner_id")).transpose()
}

/// Fails with `MissingRequiredTable` unless every table exists.
pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn parse_id(value: &str, column: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_id(value: Option<String>, column: &str) -> RepoResult<Option<RecordId>> {
    value.map(|text| parse_id(&text, column)).transpose()
}

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

pub(crate) fn parse_optional_date(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<NaiveDate>> {
    value.map(|text| parse_date(&text, column)).transpose()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn not_found(entity: &'static str, id: RecordId) -> RepoError {
    RepoError::NotFound { entity, id }
}
