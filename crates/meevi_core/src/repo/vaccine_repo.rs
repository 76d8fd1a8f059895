//! Vaccine record persistence.
//!
//! # Invariants
//! - Dates are stored as ISO `YYYY-MM-DD` text, so text comparison is date order.
//! - `list_overdue` only considers the latest record per (dog, vaccine name);
//!   a renewed dose supersedes the older record's due date.

use super::{
    date_to_db, ensure_tables, lookup_dog_owner, lookup_row_owner, not_found, parse_date, parse_id,
    parse_optional_date, DogRecordTable, OwnerLookup, RepoError, RepoResult,
};
use crate::model::vaccine::VaccineRecord;
use crate::model::validation::collapse_whitespace;
use crate::model::RecordId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const VACCINE_COLUMNS: &str = "v.id AS id,
    v.dog_id AS dog_id,
    v.vaccine_name AS vaccine_name,
    v.date_given AS date_given,
    v.next_due_date AS next_due_date,
    v.veterinarian AS veterinarian,
    v.notes AS notes";

pub trait VaccineRepository: OwnerLookup {
    fn create_vaccine(&self, record: &VaccineRecord) -> RepoResult<RecordId>;
    fn update_vaccine(&self, record: &VaccineRecord) -> RepoResult<()>;
    fn get_vaccine(&self, id: RecordId) -> RepoResult<Option<VaccineRecord>>;
    /// Lists one dog's records, most recently given first.
    fn list_for_dog(&self, dog_id: RecordId) -> RepoResult<Vec<VaccineRecord>>;
    /// Latest-per-vaccine records of an owner's dogs whose next dose is before `today`.
    fn list_overdue(&self, owner_id: RecordId, today: NaiveDate)
        -> RepoResult<Vec<VaccineRecord>>;
    fn delete_vaccine(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqliteVaccineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVaccineRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["dogs", "vaccine_records"])?;
        Ok(Self { conn })
    }
}

impl OwnerLookup for SqliteVaccineRepository<'_> {
    fn owner_of_dog(&self, dog_id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_dog_owner(self.conn, dog_id)
    }

    fn owner_of_row(&self, table: DogRecordTable, id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_row_owner(self.conn, table, id)
    }
}

impl VaccineRepository for SqliteVaccineRepository<'_> {
    fn create_vaccine(&self, record: &VaccineRecord) -> RepoResult<RecordId> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO vaccine_records (
                id,
                dog_id,
                vaccine_name,
                date_given,
                next_due_date,
                veterinarian,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.to_string(),
                record.dog_id.to_string(),
                collapse_whitespace(&record.vaccine_name),
                date_to_db(record.date_given),
                record.next_due_date.map(date_to_db),
                record.veterinarian.as_deref(),
                record.notes.as_deref(),
            ],
        )?;
        Ok(record.id)
    }

    fn update_vaccine(&self, record: &VaccineRecord) -> RepoResult<()> {
        record.validate()?;
        let changed = self.conn.execute(
            "UPDATE vaccine_records
             SET
                vaccine_name = ?1,
                date_given = ?2,
                next_due_date = ?3,
                veterinarian = ?4,
                notes = ?5
             WHERE id = ?6;",
            params![
                collapse_whitespace(&record.vaccine_name),
                date_to_db(record.date_given),
                record.next_due_date.map(date_to_db),
                record.veterinarian.as_deref(),
                record.notes.as_deref(),
                record.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("vaccine record", record.id));
        }
        Ok(())
    }

    fn get_vaccine(&self, id: RecordId) -> RepoResult<Option<VaccineRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VACCINE_COLUMNS} FROM vaccine_records v WHERE v.id = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_vaccine_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_for_dog(&self, dog_id: RecordId) -> RepoResult<Vec<VaccineRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VACCINE_COLUMNS}
             FROM vaccine_records v
             WHERE v.dog_id = ?1
             ORDER BY v.date_given DESC, v.id ASC;"
        ))?;
        let mut rows = stmt.query([dog_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_vaccine_row(row)?);
        }
        Ok(records)
    }

    fn list_overdue(
        &self,
        owner_id: RecordId,
        today: NaiveDate,
    ) -> RepoResult<Vec<VaccineRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VACCINE_COLUMNS}
             FROM vaccine_records v
             INNER JOIN dogs d ON d.id = v.dog_id
             WHERE d.owner_id = ?1
               AND v.next_due_date IS NOT NULL
               AND v.next_due_date < ?2
               AND NOT EXISTS (
                   SELECT 1
                   FROM vaccine_records newer
                   WHERE newer.dog_id = v.dog_id
                     AND newer.vaccine_name = v.vaccine_name COLLATE NOCASE
                     AND (
                         newer.date_given > v.date_given
                         OR (newer.date_given = v.date_given AND newer.id > v.id)
                     )
               )
             ORDER BY v.next_due_date ASC, v.id ASC;"
        ))?;
        let mut rows = stmt.query(params![owner_id.to_string(), date_to_db(today)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_vaccine_row(row)?);
        }
        Ok(records)
    }

    fn delete_vaccine(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM vaccine_records WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found("vaccine record", id));
        }
        Ok(())
    }
}

fn parse_vaccine_row(row: &Row<'_>) -> RepoResult<VaccineRecord> {
    let id_text: String = row.get("id")?;
    let dog_text: String = row.get("dog_id")?;
    let given_text: String = row.get("date_given")?;
    let record = VaccineRecord {
        id: parse_id(&id_text, "vaccine_records.id")?,
        dog_id: parse_id(&dog_text, "vaccine_records.dog_id")?,
        vaccine_name: row.get("vaccine_name")?,
        date_given: parse_date(&given_text, "vaccine_records.date_given")?,
        next_due_date: parse_optional_date(
            row.get("next_due_date")?,
            "vaccine_records.next_due_date",
        )?,
        veterinarian: row.get("veterinarian")?,
        notes: row.get("notes")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("vaccine_records row {id_text}: {err}")))?;
    Ok(record)
}
