use chrono::NaiveDate;
use meevi_core::model::care::FeedingRecord;
use meevi_core::model::dog::{Dog, DogDraft};
use meevi_core::model::notification::NotificationKind;
use meevi_core::model::owner::Owner;
use meevi_core::model::vaccine::VaccineRecord;
use meevi_core::open_db_in_memory;
use meevi_core::repo::care_repo::{CareRepository, SqliteCareRepository};
use meevi_core::repo::dog_repo::{DogRepository, SqliteDogRepository};
use meevi_core::repo::notification_repo::{
    NotificationListQuery, NotificationRepository, SqliteNotificationRepository,
};
use meevi_core::repo::owner_repo::{OwnerRepository, SqliteOwnerRepository};
use meevi_core::repo::vaccine_repo::{SqliteVaccineRepository, VaccineRepository};
use meevi_core::realtime::{ChangeAction, ChangeTable};
use meevi_core::repo::preferences_repo::SqlitePreferencesRepository;
use meevi_core::service::notification_service::NotificationService;
use meevi_core::service::preferences_service::{PreferencesService, PreferencesUpdate};
use meevi_core::{ChangeFeed, ChangeFilter, ReminderClock, ReminderEvaluator};
use std::sync::Arc;
use rusqlite::Connection;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn clock() -> ReminderClock {
    ReminderClock::new(date(2024, 6, 1), 1_717_243_200_000)
}

fn seed(conn: &Connection) -> (Owner, Dog) {
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let mut draft = DogDraft::named("Rex");
    draft.birth_date = Some(date(2021, 6, 1));
    let dog = Dog::from_draft(owner.id, draft, 1);
    SqliteDogRepository::try_new(conn)
        .unwrap()
        .create_dog(&dog)
        .unwrap();
    SqliteVaccineRepository::try_new(conn)
        .unwrap()
        .create_vaccine(
            &VaccineRecord::new(dog.id, "Rabies", date(2023, 1, 1))
                .with_next_due(Some(date(2024, 1, 1))),
        )
        .unwrap();
    (owner, dog)
}

#[test]
fn first_run_creates_vaccine_feeding_and_birthday_reminders() {
    let conn = open_db_in_memory().unwrap();
    let (owner, dog) = seed(&conn);

    let report = ReminderEvaluator::try_new(&conn)
        .unwrap()
        .run(owner.id, clock())
        .unwrap();

    let kinds: Vec<_> = report.created.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Vaccine,
            NotificationKind::Feeding,
            NotificationKind::Birthday
        ]
    );
    assert_eq!(report.skipped_duplicates, 0);
    assert!(report.created.iter().all(|n| n.dog_id == Some(dog.id)));
    assert_eq!(report.created[2].message, "Rex turns 3 years old today.");
}

#[test]
fn repeated_runs_do_not_duplicate_unread_reminders() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = seed(&conn);
    let evaluator = ReminderEvaluator::try_new(&conn).unwrap();

    evaluator.run(owner.id, clock()).unwrap();
    let second = evaluator.run(owner.id, clock()).unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped_duplicates, 3);

    let notifications = SqliteNotificationRepository::try_new(&conn).unwrap();
    assert_eq!(notifications.unread_count(owner.id).unwrap(), 3);

    notifications.mark_all_read(owner.id).unwrap();
    let third = evaluator.run(owner.id, clock()).unwrap();
    assert_eq!(third.created.len(), 3);

    let all = notifications
        .list_notifications(
            owner.id,
            &NotificationListQuery {
                unread_only: false,
                limit: None,
            },
        )
        .unwrap();
    assert_eq!(all.len(), 6);
}

#[test]
fn recent_feeding_and_renewed_vaccine_suppress_reminders() {
    let conn = open_db_in_memory().unwrap();
    let (owner, dog) = seed(&conn);
    let now = clock().now_ms;

    SqliteCareRepository::try_new(&conn)
        .unwrap()
        .create_feeding(&FeedingRecord::new(dog.id, "Kibble", now - HOUR_MS))
        .unwrap();
    SqliteVaccineRepository::try_new(&conn)
        .unwrap()
        .create_vaccine(
            &VaccineRecord::new(dog.id, "rabies", date(2024, 1, 5))
                .with_next_due(Some(date(2025, 1, 5))),
        )
        .unwrap();

    let report = ReminderEvaluator::try_new(&conn)
        .unwrap()
        .run(owner.id, clock())
        .unwrap();
    let kinds: Vec<_> = report.created.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Birthday]);
}

#[test]
fn disabled_rules_are_skipped() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = seed(&conn);
    PreferencesService::new(SqlitePreferencesRepository::try_new(&conn).unwrap())
        .update(
            owner.id,
            PreferencesUpdate {
                vaccine_reminders: Some(false),
                birthday_reminders: Some(false),
                ..PreferencesUpdate::default()
            },
        )
        .unwrap();

    let report = ReminderEvaluator::try_new(&conn)
        .unwrap()
        .run(owner.id, clock())
        .unwrap();
    let kinds: Vec<_> = report.created.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Feeding]);
}

#[test]
fn longer_feeding_interval_is_honoured() {
    let conn = open_db_in_memory().unwrap();
    let (owner, dog) = seed(&conn);
    let now = clock().now_ms;
    SqliteCareRepository::try_new(&conn)
        .unwrap()
        .create_feeding(&FeedingRecord::new(dog.id, "Kibble", now - 5 * HOUR_MS))
        .unwrap();
    PreferencesService::new(SqlitePreferencesRepository::try_new(&conn).unwrap())
        .update(
            owner.id,
            PreferencesUpdate {
                feeding_interval_hours: Some(8),
                ..PreferencesUpdate::default()
            },
        )
        .unwrap();

    let report = ReminderEvaluator::try_new(&conn)
        .unwrap()
        .run(owner.id, clock())
        .unwrap();
    assert!(report
        .created
        .iter()
        .all(|n| n.kind != NotificationKind::Feeding));
}

#[test]
fn mark_all_read_publishes_one_bulk_event_for_the_owner() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = seed(&conn);
    let feed = Arc::new(ChangeFeed::new());
    let inbox = feed.subscribe(ChangeFilter::tables([ChangeTable::Notifications]).owner(owner.id));

    let report = ReminderEvaluator::try_new(&conn)
        .unwrap()
        .with_change_feed(&feed)
        .run(owner.id, clock())
        .unwrap();
    let inserted: Vec<_> = inbox.try_iter().collect();
    assert_eq!(inserted.len(), report.created.len());
    assert!(inserted
        .iter()
        .all(|event| event.action == ChangeAction::Insert && event.owner_id == Some(owner.id)));

    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap())
        .with_change_feed(Arc::clone(&feed));
    assert_eq!(service.mark_all_read(owner.id).unwrap(), 3);
    let bulk: Vec<_> = inbox.try_iter().collect();
    assert_eq!(bulk.len(), 1);
    assert_eq!(bulk[0].action, ChangeAction::Bulk);
    assert_eq!(bulk[0].record_id, owner.id);

    assert_eq!(service.mark_all_read(owner.id).unwrap(), 0);
    assert!(inbox.try_recv().is_err());
}
