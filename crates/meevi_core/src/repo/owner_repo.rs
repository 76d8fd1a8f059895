//! Owner account persistence.

use super::{ensure_tables, not_found, parse_id, RepoResult};
use crate::model::owner::Owner;
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

pub trait OwnerRepository {
    fn create_owner(&self, owner: &Owner) -> RepoResult<RecordId>;
    fn get_owner(&self, id: RecordId) -> RepoResult<Option<Owner>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Owner>>;
    fn delete_owner(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqliteOwnerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOwnerRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["owners"])?;
        Ok(Self { conn })
    }
}

impl OwnerRepository for SqliteOwnerRepository<'_> {
    fn create_owner(&self, owner: &Owner) -> RepoResult<RecordId> {
        owner.validate()?;
        self.conn.execute(
            "INSERT INTO owners (id, email, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                owner.id.to_string(),
                owner.email.as_str(),
                owner.display_name.as_deref(),
                owner.created_at,
            ],
        )?;
        Ok(owner.id)
    }

    fn get_owner(&self, id: RecordId) -> RepoResult<Option<Owner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, display_name, created_at FROM owners WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_owner_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Owner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, display_name, created_at FROM owners WHERE email = ?1 COLLATE NOCASE;",
        )?;
        let mut rows = stmt.query([email.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_owner_row(row)?)),
            None => Ok(None),
        }
    }

    fn delete_owner(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM owners WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found("owner", id));
        }
        Ok(())
    }
}

fn parse_owner_row(row: &Row<'_>) -> RepoResult<Owner> {
    let id_text: String = row.get("id")?;
    Ok(Owner {
        id: parse_id(&id_text, "owners.id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        created_at: row.get("created_at")?,
    })
}
