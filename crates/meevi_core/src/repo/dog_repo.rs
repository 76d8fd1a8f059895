//! Dog profile persistence.
//!
//! # Invariants
//! - Dogs are always listed per owner, ordered by `created_at ASC, id ASC`.
//! - Deleting a dog cascades to its care, vaccine and notification rows.

use super::{
    date_to_db, ensure_tables, not_found, parse_id, parse_optional_date, RepoError, RepoResult,
};
use crate::model::dog::Dog;
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

const DOG_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    name,
    breed,
    birth_date,
    weight_kg,
    photo_url,
    notes,
    created_at,
    updated_at
FROM dogs";

pub trait DogRepository {
    fn create_dog(&self, dog: &Dog) -> RepoResult<RecordId>;
    fn update_dog(&self, dog: &Dog) -> RepoResult<()>;
    fn get_dog(&self, id: RecordId) -> RepoResult<Option<Dog>>;
    fn list_dogs(&self, owner_id: RecordId) -> RepoResult<Vec<Dog>>;
    fn count_for_owner(&self, owner_id: RecordId) -> RepoResult<u32>;
    fn set_photo_url(&self, id: RecordId, photo_url: &str, updated_at: i64) -> RepoResult<()>;
    fn delete_dog(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqliteDogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["owners", "dogs"])?;
        Ok(Self { conn })
    }
}

impl DogRepository for SqliteDogRepository<'_> {
    fn create_dog(&self, dog: &Dog) -> RepoResult<RecordId> {
        dog.validate()?;
        self.conn.execute(
            "INSERT INTO dogs (
                id,
                owner_id,
                name,
                breed,
                birth_date,
                weight_kg,
                photo_url,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                dog.id.to_string(),
                dog.owner_id.to_string(),
                dog.name.as_str(),
                dog.breed.as_deref(),
                dog.birth_date.map(date_to_db),
                dog.weight_kg,
                dog.photo_url.as_deref(),
                dog.notes.as_deref(),
                dog.created_at,
                dog.updated_at,
            ],
        )?;
        Ok(dog.id)
    }

    fn update_dog(&self, dog: &Dog) -> RepoResult<()> {
        dog.validate()?;
        let changed = self.conn.execute(
            "UPDATE dogs
             SET
                name = ?1,
                breed = ?2,
                birth_date = ?3,
                weight_kg = ?4,
                photo_url = ?5,
                notes = ?6,
                updated_at = ?7
             WHERE id = ?8;",
            params![
                dog.name.as_str(),
                dog.breed.as_deref(),
                dog.birth_date.map(date_to_db),
                dog.weight_kg,
                dog.photo_url.as_deref(),
                dog.notes.as_deref(),
                dog.updated_at,
                dog.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("dog", dog.id));
        }
        Ok(())
    }

    fn get_dog(&self, id: RecordId) -> RepoResult<Option<Dog>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOG_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_dog_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_dogs(&self, owner_id: RecordId) -> RepoResult<Vec<Dog>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOG_SELECT_SQL} WHERE owner_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut dogs = Vec::new();
        while let Some(row) = rows.next()? {
            dogs.push(parse_dog_row(row)?);
        }
        Ok(dogs)
    }

    fn count_for_owner(&self, owner_id: RecordId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM dogs WHERE owner_id = ?1;",
            [owner_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn set_photo_url(&self, id: RecordId, photo_url: &str, updated_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE dogs SET photo_url = ?1, updated_at = ?2 WHERE id = ?3;",
            params![photo_url, updated_at, id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found("dog", id));
        }
        Ok(())
    }

    fn delete_dog(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM dogs WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found("dog", id));
        }
        Ok(())
    }
}

fn parse_dog_row(row: &Row<'_>) -> RepoResult<Dog> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let dog = Dog {
        id: parse_id(&id_text, "dogs.id")?,
        owner_id: parse_id(&owner_text, "dogs.owner_id")?,
        name: row.get("name")?,
        breed: row.get("breed")?,
        birth_date: parse_optional_date(row.get("birth_date")?, "dogs.birth_date")?,
        weight_kg: row.get("weight_kg")?,
        photo_url: row.get("photo_url")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    dog.validate()
        .map_err(|err| RepoError::InvalidData(format!("dogs row {id_text}: {err}")))?;
    Ok(dog)
}
