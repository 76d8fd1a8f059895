//! Reminder preference use-cases.

use super::ServiceResult;
use crate::clock::now_epoch_ms;
use crate::model::preferences::UserPreferences;
use crate::model::RecordId;
use crate::realtime::{publish_to, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::preferences_repo::PreferencesRepository;
use serde::Deserialize;
use std::sync::Arc;

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreferencesUpdate {
    pub vaccine_reminders: Option<bool>,
    pub feeding_reminders: Option<bool>,
    pub birthday_reminders: Option<bool>,
    pub feeding_interval_hours: Option<u32>,
}

pub struct PreferencesService<R: PreferencesRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: PreferencesRepository> PreferencesService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn get(&self, owner_id: RecordId) -> ServiceResult<UserPreferences> {
        Ok(self.repo.get_preferences(owner_id)?)
    }

    pub fn update(
        &self,
        owner_id: RecordId,
        update: PreferencesUpdate,
    ) -> ServiceResult<UserPreferences> {
        let mut preferences = self.repo.get_preferences(owner_id)?;
        if let Some(value) = update.vaccine_reminders {
            preferences.vaccine_reminders = value;
        }
        if let Some(value) = update.feeding_reminders {
            preferences.feeding_reminders = value;
        }
        if let Some(value) = update.birthday_reminders {
            preferences.birthday_reminders = value;
        }
        if let Some(value) = update.feeding_interval_hours {
            preferences.feeding_interval_hours = value;
        }
        preferences.updated_at = now_epoch_ms();
        self.repo.upsert_preferences(&preferences)?;
        publish_to(
            self.feed.as_deref(),
            ChangeEvent::new(ChangeTable::Preferences, ChangeAction::Update, owner_id)
                .for_owner(owner_id),
        );
        Ok(preferences)
    }
}
