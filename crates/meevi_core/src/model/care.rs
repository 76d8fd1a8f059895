//! Care routine records: feeding, bathing, exercise and diary entries.
//!
//! # Invariants
//! - Every record references exactly one dog.
//! - Quantities (`amount_grams`, `duration_minutes`) are strictly positive.

use super::validation::{
    clean_optional, max_len, non_negative, positive, require_id, require_text, ValidationError,
    MAX_NAME_CHARS, MAX_NOTES_CHARS,
};
use super::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingRecord {
    pub id: RecordId,
    pub dog_id: RecordId,
    pub food_type: String,
    pub amount_grams: Option<f64>,
    pub fed_at: i64,
    pub notes: Option<String>,
}

impl FeedingRecord {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(dog_id: RecordId, food_type: impl Into<String>, fed_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id,
            food_type: food_type.into().trim().to_string(),
            amount_grams: None,
            fed_at,
            notes: None,
        }
    }

    pub fn with_amount(mut self, grams: f64) -> Self {
        self.amount_grams = Some(grams);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = clean_optional(notes);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.dog_id)?;
        require_text("food_type", &self.food_type, MAX_NAME_CHARS)?;
        positive("amount_grams", self.amount_grams)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathRecord {
    pub id: RecordId,
    pub dog_id: RecordId,
    pub bathed_at: i64,
    pub products: Option<String>,
    pub notes: Option<String>,
}

impl BathRecord {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(dog_id: RecordId, bathed_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id,
            bathed_at,
            products: None,
            notes: None,
        }
    }

    pub fn with_products(mut self, products: Option<String>) -> Self {
        self.products = clean_optional(products);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = clean_optional(notes);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.dog_id)?;
        max_len("products", self.products.as_deref(), MAX_NAME_CHARS * 2)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: RecordId,
    pub dog_id: RecordId,
    pub exercise_type: String,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    pub performed_at: i64,
    pub notes: Option<String>,
}

impl ExerciseRecord {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(
        dog_id: RecordId,
        exercise_type: impl Into<String>,
        duration_minutes: u32,
        performed_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id,
            exercise_type: exercise_type.into().trim().to_string(),
            duration_minutes,
            distance_km: None,
            performed_at,
            notes: None,
        }
    }

    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance_km = Some(km);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = clean_optional(notes);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.dog_id)?;
        require_text("exercise_type", &self.exercise_type, MAX_NAME_CHARS)?;
        if self.duration_minutes == 0 {
            return Err(ValidationError::NotPositive {
                field: "duration_minutes",
                value: 0.0,
            });
        }
        non_negative("distance_km", self.distance_km)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }
}

/// Category of a diary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaryKind {
    Feeding,
    Bath,
    Exercise,
    Health,
    Vet,
    Grooming,
    Medication,
    Other,
}

impl DiaryKind {
    pub const ALL: [DiaryKind; 8] = [
        DiaryKind::Feeding,
        DiaryKind::Bath,
        DiaryKind::Exercise,
        DiaryKind::Health,
        DiaryKind::Vet,
        DiaryKind::Grooming,
        DiaryKind::Medication,
        DiaryKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::Bath => "bath",
            Self::Exercise => "exercise",
            Self::Health => "health",
            Self::Vet => "vet",
            Self::Grooming => "grooming",
            Self::Medication => "medication",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: RecordId,
    pub dog_id: RecordId,
    pub kind: DiaryKind,
    pub title: String,
    pub notes: Option<String>,
    pub occurred_at: i64,
}

impl DiaryEntry {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(
        dog_id: RecordId,
        kind: DiaryKind,
        title: impl Into<String>,
        occurred_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id,
            kind,
            title: title.into().trim().to_string(),
            notes: None,
            occurred_at,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = clean_optional(notes);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.dog_id)?;
        require_text("title", &self.title, MAX_NAME_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }
}
