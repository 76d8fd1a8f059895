//! Dog profile record.
//!
//! # Invariants
//! - `name` is non-blank and at most 80 characters.
//! - `weight_kg` is strictly positive when set.

use super::validation::{
    max_len, positive, require_id, require_text, ValidationError, MAX_NAME_CHARS,
    MAX_NOTES_CHARS,
};
use super::RecordId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Form input for creating or editing a dog profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DogDraft {
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

impl DogDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Dog {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    /// Builds a new profile from form input with a generated id.
    pub fn from_draft(owner_id: RecordId, draft: DogDraft, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name.trim().to_string(),
            breed: super::validation::clean_optional(draft.breed),
            birth_date: draft.birth_date,
            weight_kg: draft.weight_kg,
            photo_url: None,
            notes: super::validation::clean_optional(draft.notes),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Replaces editable fields with form input, keeping identity and photo.
    pub fn apply_draft(&mut self, draft: DogDraft) {
        self.name = draft.name.trim().to_string();
        self.breed = super::validation::clean_optional(draft.breed);
        self.birth_date = draft.birth_date;
        self.weight_kg = draft.weight_kg;
        self.notes = super::validation::clean_optional(draft.notes);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_id(&self.owner_id)?;
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        max_len("breed", self.breed.as_deref(), MAX_NAME_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)?;
        positive("weight_kg", self.weight_kg)?;
        Ok(())
    }

    /// Returns the age in whole years when `today` is this dog's birthday.
    ///
    /// Dogs born on Feb 29 celebrate on Feb 28 in non-leap years.
    pub fn birthday_age_on(&self, today: NaiveDate) -> Option<i32> {
        let birth = self.birth_date?;
        if birth >= today {
            return None;
        }
        let matches = (birth.month(), birth.day()) == (today.month(), today.day())
            || (birth.month() == 2
                && birth.day() == 29
                && today.month() == 2
                && today.day() == 28
                && NaiveDate::from_ymd_opt(today.year(), 2, 29).is_none());
        if matches {
            Some(today.year() - birth.year())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Dog, DogDraft};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn dog_born(y: i32, m: u32, d: u32) -> Dog {
        let mut draft = DogDraft::named("Rex");
        draft.birth_date = NaiveDate::from_ymd_opt(y, m, d);
        Dog::from_draft(Uuid::new_v4(), draft, 0)
    }

    #[test]
    fn birthday_matches_month_and_day() {
        let dog = dog_born(2020, 6, 15);
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(dog.birthday_age_on(today), Some(4));
        let other = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert_eq!(dog.birthday_age_on(other), None);
    }

    #[test]
    fn leap_day_birthday_falls_back_to_feb_28() {
        let dog = dog_born(2020, 2, 29);
        let non_leap = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
        assert_eq!(dog.birthday_age_on(non_leap), Some(3));
        let leap_28 = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(dog.birthday_age_on(leap_28), None);
        let leap_29 = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(dog.birthday_age_on(leap_29), Some(4));
    }

    #[test]
    fn day_of_birth_is_not_a_birthday() {
        let dog = dog_born(2024, 3, 1);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(dog.birthday_age_on(today), None);
    }

    #[test]
    fn draft_fields_are_trimmed() {
        let mut draft = DogDraft::named("  Luna ");
        draft.breed = Some("   ".to_string());
        let dog = Dog::from_draft(Uuid::new_v4(), draft, 10);
        assert_eq!(dog.name, "Luna");
        assert_eq!(dog.breed, None);
        assert!(dog.validate().is_ok());
    }
}
