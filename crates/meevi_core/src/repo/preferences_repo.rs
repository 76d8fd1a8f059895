//! User preference persistence.
//!
//! Owners without a stored row get `UserPreferences::defaults_for`.

use super::{bool_to_int, ensure_tables, parse_bool, parse_id, RepoResult};
use crate::model::preferences::UserPreferences;
use crate::model::RecordId;
use rusqlite::{params, Connection, OptionalExtension};

pub trait PreferencesRepository {
    /// Returns stored preferences or defaults when none were saved.
    fn get_preferences(&self, owner_id: RecordId) -> RepoResult<UserPreferences>;
    fn upsert_preferences(&self, preferences: &UserPreferences) -> RepoResult<()>;
}

pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["owners", "user_preferences"])?;
        Ok(Self { conn })
    }
}

impl PreferencesRepository for SqlitePreferencesRepository<'_> {
    fn get_preferences(&self, owner_id: RecordId) -> RepoResult<UserPreferences> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    owner_id,
                    vaccine_reminders,
                    feeding_reminders,
                    birthday_reminders,
                    feeding_interval_hours,
                    onboarding_completed,
                    updated_at
                 FROM user_preferences
                 WHERE owner_id = ?1;",
                [owner_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((owner_text, vaccine, feeding, birthday, interval, onboarded, updated_at)) = row
        else {
            return Ok(UserPreferences::defaults_for(owner_id));
        };

        Ok(UserPreferences {
            owner_id: parse_id(&owner_text, "user_preferences.owner_id")?,
            vaccine_reminders: parse_bool(vaccine, "user_preferences.vaccine_reminders")?,
            feeding_reminders: parse_bool(feeding, "user_preferences.feeding_reminders")?,
            birthday_reminders: parse_bool(birthday, "user_preferences.birthday_reminders")?,
            feeding_interval_hours: interval,
            onboarding_completed: parse_bool(
                onboarded,
                "user_preferences.onboarding_completed",
            )?,
            updated_at,
        })
    }

    fn upsert_preferences(&self, preferences: &UserPreferences) -> RepoResult<()> {
        preferences.validate()?;
        self.conn.execute(
            "INSERT INTO user_preferences (
                owner_id,
                vaccine_reminders,
                feeding_reminders,
                birthday_reminders,
                feeding_interval_hours,
                onboarding_completed,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(owner_id) DO UPDATE SET
                vaccine_reminders = excluded.vaccine_reminders,
                feeding_reminders = excluded.feeding_reminders,
                birthday_reminders = excluded.birthday_reminders,
                feeding_interval_hours = excluded.feeding_interval_hours,
                onboarding_completed = excluded.onboarding_completed,
                updated_at = excluded.updated_at;",
            params![
                preferences.owner_id.to_string(),
                bool_to_int(preferences.vaccine_reminders),
                bool_to_int(preferences.feeding_reminders),
                bool_to_int(preferences.birthday_reminders),
                preferences.feeding_interval_hours,
                bool_to_int(preferences.onboarding_completed),
                preferences.updated_at,
            ],
        )?;
        Ok(())
    }
}
