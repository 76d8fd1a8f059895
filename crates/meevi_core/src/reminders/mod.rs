//! Notification rule evaluator.
//!
//! # Responsibility
//! - Turn an owner's current care data into reminder notifications.
//! - Respect per-owner reminder preferences.
//!
//! # Invariants
//! - A candidate is inserted only when no unread notification with the same
//!   `(owner, dog, kind, message)` exists.
//! - Messages are deterministic for a given input so repeated runs dedupe.
//! - One pass over the owner's dogs; no state is kept between runs.

use crate::model::dog::Dog;
use crate::model::notification::{Notification, NotificationKind};
use crate::model::preferences::UserPreferences;
use crate::model::vaccine::VaccineRecord;
use crate::model::RecordId;
use crate::realtime::{publish_to, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::care_repo::{CareRepository, SqliteCareRepository};
use crate::repo::dog_repo::{DogRepository, SqliteDogRepository};
use crate::repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
use crate::repo::preferences_repo::{PreferencesRepository, SqlitePreferencesRepository};
use crate::repo::vaccine_repo::{SqliteVaccineRepository, VaccineRepository};
use crate::repo::RepoResult;
use chrono::{Local, NaiveDate};
use log::info;
use rusqlite::Connection;
use std::collections::HashMap;
use std::time::Instant;

/// Evaluation instant. `today` is the owner's local calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderClock {
    pub today: NaiveDate,
    pub now_ms: i64,
}

impl ReminderClock {
    pub fn new(today: NaiveDate, now_ms: i64) -> Self {
        Self { today, now_ms }
    }

    /// Current local date and wall-clock time.
    pub fn system() -> Self {
        let now = Local::now();
        Self {
            today: now.date_naive(),
            now_ms: now.timestamp_millis(),
        }
    }
}

/// Outcome of one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    /// Notifications inserted by this run, in rule order.
    pub created: Vec<Notification>,
    /// Candidates dropped because an equivalent unread notification exists.
    pub skipped_duplicates: u32,
}

pub struct ReminderEvaluator<'conn> {
    dogs: SqliteDogRepository<'conn>,
    vaccines: SqliteVaccineRepository<'conn>,
    care: SqliteCareRepository<'conn>,
    preferences: SqlitePreferencesRepository<'conn>,
    notifications: SqliteNotificationRepository<'conn>,
    feed: Option<&'conn ChangeFeed>,
}

impl<'conn> ReminderEvaluator<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            dogs: SqliteDogRepository::try_new(conn)?,
            vaccines: SqliteVaccineRepository::try_new(conn)?,
            care: SqliteCareRepository::try_new(conn)?,
            preferences: SqlitePreferencesRepository::try_new(conn)?,
            notifications: SqliteNotificationRepository::try_new(conn)?,
            feed: None,
        })
    }

    pub fn with_change_feed(mut self, feed: &'conn ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Evaluates every enabled rule for `owner_id` and stores new reminders.
    pub fn run(&self, owner_id: RecordId, clock: ReminderClock) -> RepoResult<ReminderReport> {
        let started_at = Instant::now();
        let preferences = self.preferences.get_preferences(owner_id)?;
        let dogs = self.dogs.list_dogs(owner_id)?;

        let mut candidates = Vec::new();
        if preferences.vaccine_reminders {
            let overdue = self.vaccines.list_overdue(owner_id, clock.today)?;
            candidates.extend(vaccine_candidates(owner_id, &dogs, &overdue, clock));
        }
        if preferences.feeding_reminders {
            for dog in &dogs {
                let latest = self.care.latest_feeding_at(dog.id)?;
                candidates.extend(feeding_candidate(owner_id, dog, latest, &preferences, clock));
            }
        }
        if preferences.birthday_reminders {
            candidates.extend(
                dogs.iter()
                    .filter_map(|dog| birthday_candidate(owner_id, dog, clock)),
            );
        }

        let mut report = ReminderReport::default();
        for candidate in candidates {
            if self.notifications.insert_if_absent(&candidate)? {
                publish_to(
                    self.feed,
                    ChangeEvent::new(ChangeTable::Notifications, ChangeAction::Insert, candidate.id)
                        .for_owner(owner_id),
                );
                report.created.push(candidate);
            } else {
                report.skipped_duplicates += 1;
            }
        }

        info!(
            "event=reminders_run module=reminders status=ok owner_id={} dogs={} created={} skipped={} duration_ms={}",
            owner_id,
            dogs.len(),
            report.created.len(),
            report.skipped_duplicates,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

/// One reminder per overdue vaccine record of a dog the owner still has.
pub fn vaccine_candidates(
    owner_id: RecordId,
    dogs: &[Dog],
    overdue: &[VaccineRecord],
    clock: ReminderClock,
) -> Vec<Notification> {
    let names: HashMap<RecordId, &str> = dogs
        .iter()
        .map(|dog| (dog.id, dog.name.as_str()))
        .collect();

    overdue
        .iter()
        .filter_map(|record| {
            let due = record.next_due_date?;
            let dog_name = names.get(&record.dog_id)?;
            Some(Notification::new(
                owner_id,
                Some(record.dog_id),
                NotificationKind::Vaccine,
                "Vaccine overdue",
                format!(
                    "{dog_name}'s {} vaccine was due on {}.",
                    record.vaccine_name,
                    due.format("%Y-%m-%d")
                ),
                clock.now_ms,
            ))
        })
        .collect()
}

/// Reminder when the last feeding is older than the owner's interval, or missing.
pub fn feeding_candidate(
    owner_id: RecordId,
    dog: &Dog,
    latest_feeding_at: Option<i64>,
    preferences: &UserPreferences,
    clock: ReminderClock,
) -> Option<Notification> {
    let overdue = match latest_feeding_at {
        Some(fed_at) => clock.now_ms.saturating_sub(fed_at) > preferences.feeding_interval_ms(),
        None => true,
    };
    if !overdue {
        return None;
    }
    Some(Notification::new(
        owner_id,
        Some(dog.id),
        NotificationKind::Feeding,
        "Feeding reminder",
        format!(
            "{} has not been fed in the last {} hours.",
            dog.name, preferences.feeding_interval_hours
        ),
        clock.now_ms,
    ))
}

pub fn birthday_candidate(
    owner_id: RecordId,
    dog: &Dog,
    clock: ReminderClock,
) -> Option<Notification> {
    let age = dog.birthday_age_on(clock.today)?;
    let years = if age == 1 { "year" } else { "years" };
    Some(Notification::new(
        owner_id,
        Some(dog.id),
        NotificationKind::Birthday,
        "Happy birthday!",
        format!("{} turns {age} {years} old today.", dog.name),
        clock.now_ms,
    ))
}

#[cfg(test)]
mod tests {
    use super::{birthday_candidate, feeding_candidate, vaccine_candidates, ReminderClock};
    use crate::model::dog::{Dog, DogDraft};
    use crate::model::preferences::UserPreferences;
    use crate::model::vaccine::VaccineRecord;
    use chrono::NaiveDate;
    use uuid::Uuid;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn dog(owner: Uuid, name: &str, birth: Option<NaiveDate>) -> Dog {
        let mut draft = DogDraft::named(name);
        draft.birth_date = birth;
        Dog::from_draft(owner, draft, 0)
    }

    #[test]
    fn feeding_fires_after_interval_and_when_never_fed() {
        let owner = Uuid::new_v4();
        let rex = dog(owner, "Rex", None);
        let prefs = UserPreferences::defaults_for(owner);
        let clock = ReminderClock::new(date(2024, 6, 1), 10 * HOUR_MS);

        assert!(feeding_candidate(owner, &rex, Some(8 * HOUR_MS), &prefs, clock).is_none());
        assert!(feeding_candidate(owner, &rex, Some(7 * HOUR_MS), &prefs, clock).is_none());
        let late = feeding_candidate(owner, &rex, Some(6 * HOUR_MS), &prefs, clock)
            .expect("feeding overdue");
        assert_eq!(late.message, "Rex has not been fed in the last 3 hours.");
        assert!(feeding_candidate(owner, &rex, None, &prefs, clock).is_some());
    }

    #[test]
    fn birthday_message_includes_age() {
        let owner = Uuid::new_v4();
        let clock = ReminderClock::new(date(2024, 6, 1), 0);
        let one = dog(owner, "Pip", Some(date(2023, 6, 1)));
        let three = dog(owner, "Rex", Some(date(2021, 6, 1)));

        assert_eq!(
            birthday_candidate(owner, &one, clock).expect("birthday").message,
            "Pip turns 1 year old today."
        );
        assert_eq!(
            birthday_candidate(owner, &three, clock).expect("birthday").message,
            "Rex turns 3 years old today."
        );
        assert!(birthday_candidate(owner, &dog(owner, "Max", None), clock).is_none());
    }

    #[test]
    fn vaccine_candidates_skip_unknown_dogs() {
        let owner = Uuid::new_v4();
        let rex = dog(owner, "Rex", None);
        let clock = ReminderClock::new(date(2024, 6, 1), 0);
        let known = VaccineRecord::new(rex.id, "Rabies", date(2023, 1, 1))
            .with_next_due(Some(date(2024, 1, 1)));
        let stray = VaccineRecord::new(Uuid::new_v4(), "Rabies", date(2023, 1, 1))
            .with_next_due(Some(date(2024, 1, 1)));

        let created = vaccine_candidates(owner, &[rex.clone()], &[known, stray], clock);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].dog_id, Some(rex.id));
        assert_eq!(created[0].message, "Rex's Rabies vaccine was due on 2024-01-01.");
    }
}
