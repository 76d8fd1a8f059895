//! Persisted reminder notifications.

use super::validation::{require_id, ValidationError};
use super::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reminder category produced by the rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Vaccine,
    Feeding,
    Birthday,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vaccine => "vaccine",
            Self::Feeding => "feeding",
            Self::Birthday => "birthday",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vaccine" => Some(Self::Vaccine),
            "feeding" => Some(Self::Feeding),
            "birthday" => Some(Self::Birthday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub dog_id: Option<RecordId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

impl Notification {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(
        owner_id: RecordId,
        dog_id: Option<RecordId>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            dog_id,
            kind,
            title: title.into(),
            message: message.into(),
            is_read: false,
            created_at,
        }
    }
}
