//! On-device Meevi database: opening, pragmas, and schema versioning.
//!
//! Every repository takes a `&Connection` produced here, so a caller that
//! holds one can assume foreign keys are on and the schema is current.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer Meevi build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating the Meevi database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or the file could not be opened.
    Sqlite(rusqlite::Error),
    /// The directory that should hold the database file could not be created.
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file was migrated by a newer Meevi build than this one.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable code used in `error_code=` log fields and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite",
            Self::DataDir { .. } => "db_data_dir",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "meevi database error: {err}"),
            Self::DataDir { path, source } => write!(
                f,
                "cannot create meevi data directory {}: {source}",
                path.display()
            ),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "meevi database uses schema v{found} but this build only knows up to v{supported}; update the app"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::DataDir { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
