//! Owner account record.
//!
//! Authentication is handled outside core; an owner row only anchors
//! ownership of dogs, notifications and preferences.

use super::validation::{require_id, require_text, ValidationError, MAX_NAME_CHARS};
use super::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_EMAIL_CHARS: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: RecordId,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: i64,
}

impl Owner {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(email: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_string(),
            display_name: None,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_text("email", &self.email, MAX_EMAIL_CHARS)?;
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidFormat("email"));
        }
        if let Some(name) = self.display_name.as_deref() {
            require_text("display_name", name, MAX_NAME_CHARS)?;
        }
        Ok(())
    }
}
