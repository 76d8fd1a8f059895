//! Vaccine administration record.
//!
//! # Invariants
//! - `vaccine_name` is non-blank with whitespace collapsed to single spaces.
//! - `next_due_date`, when set, is not earlier than `date_given`.
//! - Deserialization enforces the same invariants as `validate()`.

use super::validation::{
    clean_optional, collapse_whitespace, max_len, require_id, require_text, ValidationError,
    MAX_NAME_CHARS, MAX_NOTES_CHARS,
};
use super::RecordId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VaccineRecordWire")]
pub struct VaccineRecord {
    pub id: RecordId,
    pub dog_id: RecordId,
    pub vaccine_name: String,
    pub date_given: NaiveDate,
    pub next_due_date: Option<NaiveDate>,
    pub veterinarian: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
struct VaccineRecordWire {
    id: RecordId,
    dog_id: RecordId,
    vaccine_name: String,
    date_given: NaiveDate,
    next_due_date: Option<NaiveDate>,
    veterinarian: Option<String>,
    notes: Option<String>,
}

impl TryFrom<VaccineRecordWire> for VaccineRecord {
    type Error = ValidationError;

    fn try_from(wire: VaccineRecordWire) -> Result<Self, Self::Error> {
        let record = Self {
            id: wire.id,
            dog_id: wire.dog_id,
            vaccine_name: collapse_whitespace(&wire.vaccine_name),
            date_given: wire.date_given,
            next_due_date: wire.next_due_date,
            veterinarian: wire.veterinarian,
            notes: wire.notes,
        };
        record.validate()?;
        Ok(record)
    }
}

impl VaccineRecord {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(dog_id: RecordId, vaccine_name: impl Into<String>, date_given: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id,
            vaccine_name: collapse_whitespace(&vaccine_name.into()),
            date_given,
            next_due_date: None,
            veterinarian: None,
            notes: None,
        }
    }

    pub fn with_next_due(mut self, next_due_date: Option<NaiveDate>) -> Self {
        self.next_due_date = next_due_date;
        self
    }

    pub fn with_veterinarian(mut self, veterinarian: Option<String>) -> Self {
        self.veterinarian = clean_optional(veterinarian);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.dog_id)?;
        require_text("vaccine_name", &self.vaccine_name, MAX_NAME_CHARS)?;
        max_len("veterinarian", self.veterinarian.as_deref(), MAX_NAME_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)?;
        if let Some(next_due) = self.next_due_date {
            if next_due < self.date_given {
                return Err(ValidationError::DateOrder {
                    earlier: "date_given",
                    later: "next_due_date",
                });
            }
        }
        Ok(())
    }

    /// Whether the next dose was due before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.next_due_date.is_some_and(|due| due < today)
    }
}
