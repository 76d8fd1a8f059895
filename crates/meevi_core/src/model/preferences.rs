//! Per-owner reminder preferences and onboarding state.

use super::validation::ValidationError;
use super::RecordId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEEDING_INTERVAL_HOURS: u32 = 3;
const MAX_FEEDING_INTERVAL_HOURS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub owner_id: RecordId,
    pub vaccine_reminders: bool,
    pub feeding_reminders: bool,
    pub birthday_reminders: bool,
    pub feeding_interval_hours: u32,
    pub onboarding_completed: bool,
    pub updated_at: i64,
}

impl UserPreferences {
    /// Preferences used when an owner never saved any.
    pub fn defaults_for(owner_id: RecordId) -> Self {
        Self {
            owner_id,
            vaccine_reminders: true,
            feeding_reminders: true,
            birthday_reminders: true,
            feeding_interval_hours: DEFAULT_FEEDING_INTERVAL_HOURS,
            onboarding_completed: false,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if !(1..=MAX_FEEDING_INTERVAL_HOURS).contains(&self.feeding_interval_hours) {
            return Err(ValidationError::OutOfRange {
                field: "feeding_interval_hours",
                value: i64::from(self.feeding_interval_hours),
                min: 1,
                max: i64::from(MAX_FEEDING_INTERVAL_HOURS),
            });
        }
        Ok(())
    }

    /// Feeding gap after which a reminder fires, in milliseconds.
    pub fn feeding_interval_ms(&self) -> i64 {
        i64::from(self.feeding_interval_hours) * 60 * 60 * 1000
    }
}
