//! Notification persistence with unread-window deduplication.
//!
//! # Invariants
//! - At most one unread notification exists per (owner, dog, kind, message)
//!   when rows are written through `insert_if_absent`.
//! - Lists are ordered `created_at DESC, id ASC`.

use super::{bool_to_int, ensure_tables, not_found, parse_bool, parse_id, parse_optional_id};
use super::{RepoError, RepoResult};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    dog_id,
    kind,
    title,
    message,
    is_read,
    created_at
FROM notifications";
const NOTIFICATIONS_DEFAULT_LIMIT: u32 = 50;
const NOTIFICATIONS_LIMIT_MAX: u32 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationListQuery {
    pub unread_only: bool,
    /// Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
}

pub trait NotificationRepository {
    fn create_notification(&self, notification: &Notification) -> RepoResult<RecordId>;
    /// Inserts unless an unread duplicate exists; returns whether a row was written.
    fn insert_if_absent(&self, notification: &Notification) -> RepoResult<bool>;
    fn exists_unread(
        &self,
        owner_id: RecordId,
        dog_id: Option<RecordId>,
        kind: NotificationKind,
        message: &str,
    ) -> RepoResult<bool>;
    fn get_notification(&self, id: RecordId) -> RepoResult<Option<Notification>>;
    fn list_notifications(
        &self,
        owner_id: RecordId,
        query: &NotificationListQuery,
    ) -> RepoResult<Vec<Notification>>;
    fn mark_read(&self, id: RecordId) -> RepoResult<()>;
    fn mark_all_read(&self, owner_id: RecordId) -> RepoResult<u32>;
    fn unread_count(&self, owner_id: RecordId) -> RepoResult<u32>;
    fn delete_notification(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["owners", "notifications"])?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create_notification(&self, notification: &Notification) -> RepoResult<RecordId> {
        validate_notification(notification)?;
        self.conn.execute(
            "INSERT INTO notifications (
                id,
                owner_id,
                dog_id,
                kind,
                title,
                message,
                is_read,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                notification.id.to_string(),
                notification.owner_id.to_string(),
                notification.dog_id.map(|id| id.to_string()),
                notification.kind.as_str(),
                notification.title.as_str(),
                notification.message.as_str(),
                bool_to_int(notification.is_read),
                notification.created_at,
            ],
        )?;
        Ok(notification.id)
    }

    fn insert_if_absent(&self, notification: &Notification) -> RepoResult<bool> {
        validate_notification(notification)?;
        let inserted = self.conn.execute(
            "INSERT INTO notifications (
                id,
                owner_id,
                dog_id,
                kind,
                title,
                message,
                is_read,
                created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, 0, ?7
            WHERE NOT EXISTS (
                SELECT 1
                FROM notifications
                WHERE owner_id = ?2
                  AND dog_id IS ?3
                  AND kind = ?4
                  AND message = ?6
                  AND is_read = 0
            );",
            params![
                notification.id.to_string(),
                notification.owner_id.to_string(),
                notification.dog_id.map(|id| id.to_string()),
                notification.kind.as_str(),
                notification.title.as_str(),
                notification.message.as_str(),
                notification.created_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn exists_unread(
        &self,
        owner_id: RecordId,
        dog_id: Option<RecordId>,
        kind: NotificationKind,
        message: &str,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM notifications
                WHERE owner_id = ?1
                  AND dog_id IS ?2
                  AND kind = ?3
                  AND message = ?4
                  AND is_read = 0
            );",
            params![
                owner_id.to_string(),
                dog_id.map(|id| id.to_string()),
                kind.as_str(),
                message,
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_notification(&self, id: RecordId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_notification_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_notifications(
        &self,
        owner_id: RecordId,
        query: &NotificationListQuery,
    ) -> RepoResult<Vec<Notification>> {
        let mut sql = format!("{NOTIFICATION_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner_id.to_string())];
        if query.unread_only {
            sql.push_str(" AND is_read = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_notification_limit(
            query.limit,
        ))));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_notification_row(row)?);
        }
        Ok(items)
    }

    fn mark_read(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found("notification", id));
        }
        Ok(())
    }

    fn mark_all_read(&self, owner_id: RecordId) -> RepoResult<u32> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE owner_id = ?1 AND is_read = 0;",
            [owner_id.to_string()],
        )?;
        u32::try_from(changed)
            .map_err(|_| RepoError::InvalidData(format!("mark_all_read touched {changed} rows")))
    }

    fn unread_count(&self, owner_id: RecordId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE owner_id = ?1 AND is_read = 0;",
            [owner_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn delete_notification(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found("notification", id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to the notification contract.
pub fn normalize_notification_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTIFICATIONS_DEFAULT_LIMIT,
        Some(value) if value > NOTIFICATIONS_LIMIT_MAX => NOTIFICATIONS_LIMIT_MAX,
        Some(value) => value,
    }
}

fn validate_notification(notification: &Notification) -> RepoResult<()> {
    if notification.id.is_nil() || notification.owner_id.is_nil() {
        return Err(crate::model::validation::ValidationError::NilId.into());
    }
    if notification.message.trim().is_empty() {
        return Err(crate::model::validation::ValidationError::BlankField("message").into());
    }
    Ok(())
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification kind `{kind_text}` in notifications.kind"
        ))
    })?;
    Ok(Notification {
        id: parse_id(&id_text, "notifications.id")?,
        owner_id: parse_id(&owner_text, "notifications.owner_id")?,
        dog_id: parse_optional_id(row.get("dog_id")?, "notifications.dog_id")?,
        kind,
        title: row.get("title")?,
        message: row.get("message")?,
        is_read: parse_bool(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}
