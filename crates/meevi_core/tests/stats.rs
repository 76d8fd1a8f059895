use chrono::NaiveDate;
use meevi_core::model::care::{BathRecord, ExerciseRecord, FeedingRecord};
use meevi_core::model::dog::{Dog, DogDraft};
use meevi_core::model::owner::Owner;
use meevi_core::model::vaccine::VaccineRecord;
use meevi_core::open_db_in_memory;
use meevi_core::repo::care_repo::{CareRepository, SqliteCareRepository};
use meevi_core::repo::dog_repo::{DogRepository, SqliteDogRepository};
use meevi_core::repo::owner_repo::{OwnerRepository, SqliteOwnerRepository};
use meevi_core::repo::vaccine_repo::{SqliteVaccineRepository, VaccineRepository};
use meevi_core::stats::dog_stats;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
// 2024-06-01T00:00:00Z
const NOW: i64 = 1_717_200_000_000;

#[test]
fn stats_count_window_and_report_bath_gap() {
    let conn = open_db_in_memory().unwrap();
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(&conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let mut draft = DogDraft::named("Rex");
    draft.birth_date = NaiveDate::from_ymd_opt(2024, 1, 1);
    let dog = Dog::from_draft(owner.id, draft, 1);
    SqliteDogRepository::try_new(&conn)
        .unwrap()
        .create_dog(&dog)
        .unwrap();

    let care = SqliteCareRepository::try_new(&conn).unwrap();
    care.create_feeding(&FeedingRecord::new(dog.id, "Kibble", NOW - DAY_MS))
        .unwrap();
    care.create_feeding(&FeedingRecord::new(dog.id, "Kibble", NOW - 40 * DAY_MS))
        .unwrap();
    care.create_bath(&BathRecord::new(dog.id, NOW - 10 * DAY_MS))
        .unwrap();
    care.create_exercise(&ExerciseRecord::new(dog.id, "Walk", 45, NOW - 2 * DAY_MS).with_distance(3.0))
        .unwrap();
    care.create_exercise(&ExerciseRecord::new(dog.id, "Fetch", 15, NOW - 3 * DAY_MS))
        .unwrap();

    let vaccines = SqliteVaccineRepository::try_new(&conn).unwrap();
    vaccines
        .create_vaccine(&VaccineRecord::new(
            dog.id,
            "Bordetella",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ))
        .unwrap();

    let stats = dog_stats(&care, &vaccines, &dog, None, NOW).unwrap();
    assert_eq!(stats.window_days, 30);
    assert_eq!(stats.feedings, 1);
    assert_eq!(stats.baths, 1);
    assert_eq!(stats.exercise_sessions, 2);
    assert_eq!(stats.exercise_minutes, 60);
    assert!((stats.exercise_distance_km - 3.0).abs() < f64::EPSILON);
    assert_eq!(stats.last_feeding_at, Some(NOW - DAY_MS));
    assert_eq!(stats.days_since_last_bath, Some(10));
    // Five months old: the 2, 3 and 4 month vaccines are due.
    assert_eq!(stats.vaccines_completed, 1);
    assert_eq!(stats.vaccines_overdue, 5);

    let wide = dog_stats(&care, &vaccines, &dog, Some(60), NOW).unwrap();
    assert_eq!(wide.feedings, 2);
}
