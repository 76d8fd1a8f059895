//! Feeding, bath and exercise record persistence.
//!
//! # Responsibility
//! - CRUD over the three routine tables.
//! - Time-window aggregates used by the statistics view and reminders.
//!
//! # Invariants
//! - Lists are ordered newest first (`<time> DESC, id ASC`).
//! - `since` filters are inclusive epoch-millisecond lower bounds.

use super::{
    ensure_tables, lookup_dog_owner, lookup_row_owner, not_found, parse_id, DogRecordTable,
    OwnerLookup, RepoError, RepoResult,
};
use crate::model::care::{BathRecord, ExerciseRecord, FeedingRecord};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const DEFAULT_LIST_LIMIT: u32 = 50;
const LIST_LIMIT_MAX: u32 = 500;

/// Window and paging options for routine lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareListQuery {
    /// Inclusive lower bound in epoch milliseconds.
    pub since: Option<i64>,
    /// Defaults to 50 and clamps to 500.
    pub limit: Option<u32>,
}

/// Aggregates over one dog's routines since a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareTotals {
    pub feedings: u32,
    pub baths: u32,
    pub exercise_sessions: u32,
    pub exercise_minutes: u64,
    pub exercise_distance_km: f64,
}

pub trait CareRepository: OwnerLookup {
    fn create_feeding(&self, record: &FeedingRecord) -> RepoResult<RecordId>;
    fn update_feeding(&self, record: &FeedingRecord) -> RepoResult<()>;
    fn list_feedings(&self, dog_id: RecordId, query: &CareListQuery)
        -> RepoResult<Vec<FeedingRecord>>;
    fn delete_feeding(&self, id: RecordId) -> RepoResult<()>;
    /// Timestamp of the most recent feeding for a dog.
    fn latest_feeding_at(&self, dog_id: RecordId) -> RepoResult<Option<i64>>;

    fn create_bath(&self, record: &BathRecord) -> RepoResult<RecordId>;
    fn update_bath(&self, record: &BathRecord) -> RepoResult<()>;
    fn list_baths(&self, dog_id: RecordId, query: &CareListQuery) -> RepoResult<Vec<BathRecord>>;
    fn delete_bath(&self, id: RecordId) -> RepoResult<()>;
    fn latest_bath_at(&self, dog_id: RecordId) -> RepoResult<Option<i64>>;

    fn create_exercise(&self, record: &ExerciseRecord) -> RepoResult<RecordId>;
    fn update_exercise(&self, record: &ExerciseRecord) -> RepoResult<()>;
    fn list_exercises(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> RepoResult<Vec<ExerciseRecord>>;
    fn delete_exercise(&self, id: RecordId) -> RepoResult<()>;

    fn totals_since(&self, dog_id: RecordId, since: i64) -> RepoResult<CareTotals>;
}

pub struct SqliteCareRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCareRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["dogs", "feeding_records", "bath_records", "exercise_records"],
        )?;
        Ok(Self { conn })
    }

    fn delete_from(
        &self,
        table: &'static str,
        entity: &'static str,
        id: RecordId,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1;"),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found(entity, id));
        }
        Ok(())
    }

    fn latest_time(
        &self,
        table: &'static str,
        column: &'static str,
        dog_id: RecordId,
    ) -> RepoResult<Option<i64>> {
        let latest: Option<i64> = self.conn.query_row(
            &format!("SELECT MAX({column}) FROM {table} WHERE dog_id = ?1;"),
            [dog_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(latest)
    }

    fn list_rows<T>(
        &self,
        select_sql: &str,
        time_column: &'static str,
        dog_id: RecordId,
        query: &CareListQuery,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut sql = format!("{select_sql} WHERE dog_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(dog_id.to_string())];
        if let Some(since) = query.since {
            sql.push_str(&format!(" AND {time_column} >= ?"));
            bind_values.push(Value::Integer(since));
        }
        sql.push_str(&format!(" ORDER BY {time_column} DESC, id ASC LIMIT ?"));
        bind_values.push(Value::Integer(i64::from(normalize_care_limit(query.limit))));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse(row)?);
        }
        Ok(items)
    }
}

const FEEDING_SELECT_SQL: &str =
    "SELECT id, dog_id, food_type, amount_grams, fed_at, notes FROM feeding_records";
const BATH_SELECT_SQL: &str = "SELECT id, dog_id, bathed_at, products, notes FROM bath_records";
const EXERCISE_SELECT_SQL: &str = "SELECT
    id,
    dog_id,
    exercise_type,
    duration_minutes,
    distance_km,
    performed_at,
    notes
FROM exercise_records";

impl OwnerLookup for SqliteCareRepository<'_> {
    fn owner_of_dog(&self, dog_id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_dog_owner(self.conn, dog_id)
    }

    fn owner_of_row(&self, table: DogRecordTable, id: RecordId) -> RepoResult<Option<RecordId>> {
        lookup_row_owner(self.conn, table, id)
    }
}

impl CareRepository for SqliteCareRepository<'_> {
    fn create_feeding(&self, record: &FeedingRecord) -> RepoResult<RecordId> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO feeding_records (id, dog_id, food_type, amount_grams, fed_at, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                record.id.to_string(),
                record.dog_id.to_string(),
                record.food_type.as_str(),
                record.amount_grams,
                record.fed_at,
                record.notes.as_deref(),
            ],
        )?;
        Ok(record.id)
    }

    fn update_feeding(&self, record: &FeedingRecord) -> RepoResult<()> {
        record.validate()?;
        let changed = self.conn.execute(
            "UPDATE feeding_records
             SET food_type = ?1, amount_grams = ?2, fed_at = ?3, notes = ?4
             WHERE id = ?5;",
            params![
                record.food_type.as_str(),
                record.amount_grams,
                record.fed_at,
                record.notes.as_deref(),
                record.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("feeding record", record.id));
        }
        Ok(())
    }

    fn list_feedings(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> RepoResult<Vec<FeedingRecord>> {
        self.list_rows(FEEDING_SELECT_SQL, "fed_at", dog_id, query, parse_feeding_row)
    }

    fn delete_feeding(&self, id: RecordId) -> RepoResult<()> {
        self.delete_from("feeding_records", "feeding record", id)
    }

    fn latest_feeding_at(&self, dog_id: RecordId) -> RepoResult<Option<i64>> {
        self.latest_time("feeding_records", "fed_at", dog_id)
    }

    fn create_bath(&self, record: &BathRecord) -> RepoResult<RecordId> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO bath_records (id, dog_id, bathed_at, products, notes)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                record.dog_id.to_string(),
                record.bathed_at,
                record.products.as_deref(),
                record.notes.as_deref(),
            ],
        )?;
        Ok(record.id)
    }

    fn update_bath(&self, record: &BathRecord) -> RepoResult<()> {
        record.validate()?;
        let changed = self.conn.execute(
            "UPDATE bath_records
             SET bathed_at = ?1, products = ?2, notes = ?3
             WHERE id = ?4;",
            params![
                record.bathed_at,
                record.products.as_deref(),
                record.notes.as_deref(),
                record.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("bath record", record.id));
        }
        Ok(())
    }

    fn list_baths(&self, dog_id: RecordId, query: &CareListQuery) -> RepoResult<Vec<BathRecord>> {
        self.list_rows(BATH_SELECT_SQL, "bathed_at", dog_id, query, parse_bath_row)
    }

    fn delete_bath(&self, id: RecordId) -> RepoResult<()> {
        self.delete_from("bath_records", "bath record", id)
    }

    fn latest_bath_at(&self, dog_id: RecordId) -> RepoResult<Option<i64>> {
        self.latest_time("bath_records", "bathed_at", dog_id)
    }

    fn create_exercise(&self, record: &ExerciseRecord) -> RepoResult<RecordId> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO exercise_records (
                id,
                dog_id,
                exercise_type,
                duration_minutes,
                distance_km,
                performed_at,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.to_string(),
                record.dog_id.to_string(),
                record.exercise_type.as_str(),
                record.duration_minutes,
                record.distance_km,
                record.performed_at,
                record.notes.as_deref(),
            ],
        )?;
        Ok(record.id)
    }

    fn update_exercise(&self, record: &ExerciseRecord) -> RepoResult<()> {
        record.validate()?;
        let changed = self.conn.execute(
            "UPDATE exercise_records
             SET
                exercise_type = ?1,
                duration_minutes = ?2,
                distance_km = ?3,
                performed_at = ?4,
                notes = ?5
             WHERE id = ?6;",
            params![
                record.exercise_type.as_str(),
                record.duration_minutes,
                record.distance_km,
                record.performed_at,
                record.notes.as_deref(),
                record.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("exercise record", record.id));
        }
        Ok(())
    }

    fn list_exercises(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> RepoResult<Vec<ExerciseRecord>> {
        self.list_rows(
            EXERCISE_SELECT_SQL,
            "performed_at",
            dog_id,
            query,
            parse_exercise_row,
        )
    }

    fn delete_exercise(&self, id: RecordId) -> RepoResult<()> {
        self.delete_from("exercise_records", "exercise record", id)
    }

    fn totals_since(&self, dog_id: RecordId, since: i64) -> RepoResult<CareTotals> {
        let dog = dog_id.to_string();
        let feedings: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM feeding_records WHERE dog_id = ?1 AND fed_at >= ?2;",
            params![dog.as_str(), since],
            |row| row.get(0),
        )?;
        let baths: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM bath_records WHERE dog_id = ?1 AND bathed_at >= ?2;",
            params![dog.as_str(), since],
            |row| row.get(0),
        )?;
        let (exercise_sessions, exercise_minutes, exercise_distance_km): (u32, i64, f64) =
            self.conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(duration_minutes), 0),
                    COALESCE(SUM(distance_km), 0.0)
                 FROM exercise_records
                 WHERE dog_id = ?1 AND performed_at >= ?2;",
                params![dog.as_str(), since],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        Ok(CareTotals {
            feedings,
            baths,
            exercise_sessions,
            exercise_minutes: u64::try_from(exercise_minutes).map_err(|_| {
                RepoError::InvalidData(format!(
                    "negative exercise minutes sum `{exercise_minutes}`"
                ))
            })?,
            exercise_distance_km,
        })
    }
}

/// Normalizes list limit according to the routine list contract.
pub fn normalize_care_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => DEFAULT_LIST_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}

fn parse_feeding_row(row: &Row<'_>) -> RepoResult<FeedingRecord> {
    let id_text: String = row.get("id")?;
    let dog_text: String = row.get("dog_id")?;
    let record = FeedingRecord {
        id: parse_id(&id_text, "feeding_records.id")?,
        dog_id: parse_id(&dog_text, "feeding_records.dog_id")?,
        food_type: row.get("food_type")?,
        amount_grams: row.get("amount_grams")?,
        fed_at: row.get("fed_at")?,
        notes: row.get("notes")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("feeding_records row {id_text}: {err}")))?;
    Ok(record)
}

fn parse_bath_row(row: &Row<'_>) -> RepoResult<BathRecord> {
    let id_text: String = row.get("id")?;
    let dog_text: String = row.get("dog_id")?;
    Ok(BathRecord {
        id: parse_id(&id_text, "bath_records.id")?,
        dog_id: parse_id(&dog_text, "bath_records.dog_id")?,
        bathed_at: row.get("bathed_at")?,
        products: row.get("products")?,
        notes: row.get("notes")?,
    })
}

fn parse_exercise_row(row: &Row<'_>) -> RepoResult<ExerciseRecord> {
    let id_text: String = row.get("id")?;
    let dog_text: String = row.get("dog_id")?;
    let record = ExerciseRecord {
        id: parse_id(&id_text, "exercise_records.id")?,
        dog_id: parse_id(&dog_text, "exercise_records.dog_id")?,
        exercise_type: row.get("exercise_type")?,
        duration_minutes: row.get("duration_minutes")?,
        distance_km: row.get("distance_km")?,
        performed_at: row.get("performed_at")?,
        notes: row.get("notes")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("exercise_records row {id_text}: {err}")))?;
    Ok(record)
}
