//! Calendar events with simple recurrence.
//!
//! # Responsibility
//! - Describe health events kept in the local-only `calendar_events` collection.
//! - Expand recurring events into concrete dates for a query window.
//!
//! # Invariants
//! - Occurrences are computed from the anchor `date`, never from a previous
//!   occurrence, so monthly events anchored on the 31st do not drift.
//! - Monthly/yearly occurrences clamp to the last day of short months.

use super::validation::{
    clean_optional, max_len, require_id, require_text, ValidationError, MAX_NAME_CHARS,
    MAX_NOTES_CHARS,
};
use super::RecordId;
use chrono::{Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time-of-day regex"));

/// Upper bound on expanded occurrences per event and query.
const MAX_OCCURRENCES: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Vaccination,
    VetVisit,
    Grooming,
    Medication,
    Deworming,
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Vaccination,
        EventCategory::VetVisit,
        EventCategory::Grooming,
        EventCategory::Medication,
        EventCategory::Deworming,
        EventCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vaccination => "vaccination",
            Self::VetVisit => "vet_visit",
            Self::Grooming => "grooming",
            Self::Medication => "medication",
            Self::Deworming => "deworming",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 5] = [
        Recurrence::None,
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: RecordId,
    pub dog_id: Option<RecordId>,
    pub title: String,
    pub category: EventCategory,
    pub date: NaiveDate,
    pub time: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl CalendarEvent {
    /// Replaces the generated id with a known one (import and sync paths).
    ///
    /// Nil ids are rejected; every other field is checked by `validate`.
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(title: impl Into<String>, category: EventCategory, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id: None,
            title: title.into().trim().to_string(),
            category,
            date,
            time: None,
            recurrence: Recurrence::None,
            notes: None,
            completed: false,
        }
    }

    pub fn for_dog(mut self, dog_id: RecordId) -> Self {
        self.dog_id = Some(dog_id);
        self
    }

    pub fn repeating(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn at_time(mut self, time: impl Into<String>) -> Self {
        self.time = clean_optional(Some(time.into()));
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_text("title", &self.title, MAX_NAME_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)?;
        if let Some(time) = self.time.as_deref() {
            if !TIME_OF_DAY_RE.is_match(time) {
                return Err(ValidationError::InvalidTimeOfDay(time.to_string()));
            }
        }
        Ok(())
    }

    /// Returns every occurrence date within `from..=to`, ascending.
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        if to < from || to < self.date {
            return Vec::new();
        }

        let mut dates = Vec::new();
        let mut index = self.first_candidate_index(from);
        while dates.len() < MAX_OCCURRENCES {
            let Some(date) = self.nth_occurrence(index) else {
                break;
            };
            if date > to {
                break;
            }
            if date >= from {
                dates.push(date);
            }
            if self.recurrence == Recurrence::None {
                break;
            }
            index += 1;
        }
        dates
    }

    fn nth_occurrence(&self, n: u32) -> Option<NaiveDate> {
        match self.recurrence {
            Recurrence::None => (n == 0).then_some(self.date),
            Recurrence::Daily => self.date.checked_add_days(Days::new(u64::from(n))),
            Recurrence::Weekly => self.date.checked_add_days(Days::new(u64::from(n) * 7)),
            Recurrence::Monthly => self.date.checked_add_months(Months::new(n)),
            Recurrence::Yearly => self.date.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    // Skips whole periods before `from` so long-running series stay cheap.
    fn first_candidate_index(&self, from: NaiveDate) -> u32 {
        if from <= self.date {
            return 0;
        }
        let days = (from - self.date).num_days().max(0) as u64;
        let skipped = match self.recurrence {
            Recurrence::None => 0,
            Recurrence::Daily => days,
            Recurrence::Weekly => days / 7,
            Recurrence::Monthly => (days / 31).saturating_sub(1),
            Recurrence::Yearly => (days / 366).saturating_sub(1),
        };
        u32::try_from(skipped).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::{CalendarEvent, EventCategory, Recurrence};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn labels_match_serde_names() {
        for category in EventCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
            assert_eq!(EventCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(Recurrence::parse(" monthly "), Some(Recurrence::Monthly));
        assert_eq!(Recurrence::parse("fortnightly"), None);
    }

    #[test]
    fn single_event_occurs_once_inside_window() {
        let event = CalendarEvent::new("Vet", EventCategory::VetVisit, date(2024, 5, 10));
        assert_eq!(
            event.occurrences_between(date(2024, 5, 1), date(2024, 5, 31)),
            vec![date(2024, 5, 10)]
        );
        assert!(event
            .occurrences_between(date(2024, 6, 1), date(2024, 6, 30))
            .is_empty());
    }

    #[test]
    fn weekly_event_skips_to_window() {
        let event = CalendarEvent::new("Pill", EventCategory::Medication, date(2024, 1, 1))
            .repeating(Recurrence::Weekly);
        let dates = event.occurrences_between(date(2024, 3, 1), date(2024, 3, 15));
        assert_eq!(dates, vec![date(2024, 3, 4), date(2024, 3, 11)]);
    }

    #[test]
    fn monthly_event_clamps_to_month_end_without_drift() {
        let event = CalendarEvent::new("Flea", EventCategory::Medication, date(2024, 1, 31))
            .repeating(Recurrence::Monthly);
        let dates = event.occurrences_between(date(2024, 1, 1), date(2024, 4, 30));
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30)
            ]
        );
    }

    #[test]
    fn yearly_event_far_in_future_window() {
        let event = CalendarEvent::new("Booster", EventCategory::Vaccination, date(2020, 6, 1))
            .repeating(Recurrence::Yearly);
        let dates = event.occurrences_between(date(2030, 1, 1), date(2030, 12, 31));
        assert_eq!(dates, vec![date(2030, 6, 1)]);
    }

    #[test]
    fn validate_rejects_bad_time() {
        let event =
            CalendarEvent::new("Walk", EventCategory::Other, date(2024, 1, 1)).at_time("25:00");
        assert!(event.validate().is_err());
        let ok = CalendarEvent::new("Walk", EventCategory::Other, date(2024, 1, 1)).at_time("07:30");
        assert!(ok.validate().is_ok());
    }
}
