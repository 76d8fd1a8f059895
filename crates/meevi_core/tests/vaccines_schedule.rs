use chrono::NaiveDate;
use meevi_core::model::dog::DogDraft;
use meevi_core::model::vaccine::VaccineRecord;
use meevi_core::open_db_in_memory;
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::owner_repo::{OwnerRepository, SqliteOwnerRepository};
use meevi_core::repo::vaccine_repo::SqliteVaccineRepository;
use meevi_core::schedule::VaccineStatus;
use meevi_core::service::dog_service::DogService;
use meevi_core::service::vaccine_service::VaccineService;
use meevi_core::model::owner::Owner;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn schedule_reflects_recorded_vaccines() {
    let conn = open_db_in_memory().unwrap();
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(&conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let mut draft = DogDraft::named("Pup");
    draft.birth_date = Some(date(2024, 1, 1));
    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .create_dog(owner.id, draft)
        .unwrap();
    let vaccines = VaccineService::new(SqliteVaccineRepository::try_new(&conn).unwrap());

    vaccines
        .record_vaccine(&VaccineRecord::new(dog.id, "DHPP (1st dose)", date(2024, 3, 1)))
        .unwrap();

    let schedule = vaccines.schedule_for(&dog, date(2024, 3, 5)).unwrap();
    assert_eq!(schedule.age_months, Some(2));
    assert_eq!(schedule.items[0].status, VaccineStatus::Completed);
    assert_eq!(schedule.items[1].status, VaccineStatus::Overdue);
    assert_eq!(schedule.summary.completed, 1);
    assert_eq!(schedule.summary.overdue, 1);
    assert_eq!(schedule.summary.upcoming, 6);
}

#[test]
fn next_due_before_date_given_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(&conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .create_dog(owner.id, DogDraft::named("Rex"))
        .unwrap();
    let vaccines = VaccineService::new(SqliteVaccineRepository::try_new(&conn).unwrap());

    let err = vaccines
        .record_vaccine(
            &VaccineRecord::new(dog.id, "Rabies", date(2024, 5, 1))
                .with_next_due(Some(date(2024, 4, 1))),
        )
        .unwrap_err();
    assert_eq!(err.code(), "validation_failed");
}

#[test]
fn overdue_lists_only_latest_record_per_vaccine() {
    let conn = open_db_in_memory().unwrap();
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(&conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .create_dog(owner.id, DogDraft::named("Rex"))
        .unwrap();
    let vaccines = VaccineService::new(SqliteVaccineRepository::try_new(&conn).unwrap());

    vaccines
        .record_vaccine(
            &VaccineRecord::new(dog.id, "Rabies", date(2022, 1, 1))
                .with_next_due(Some(date(2023, 1, 1))),
        )
        .unwrap();
    vaccines
        .record_vaccine(
            &VaccineRecord::new(dog.id, "DHPP", date(2022, 1, 1))
                .with_next_due(Some(date(2023, 1, 1))),
        )
        .unwrap();
    vaccines
        .record_vaccine(
            &VaccineRecord::new(dog.id, "Rabies", date(2023, 1, 2))
                .with_next_due(Some(date(2026, 1, 2))),
        )
        .unwrap();

    let overdue = vaccines.list_overdue(owner.id, date(2024, 6, 1)).unwrap();
    let names: Vec<_> = overdue.iter().map(|r| r.vaccine_name.as_str()).collect();
    assert_eq!(names, vec!["DHPP"]);
}

#[test]
fn renewal_matches_despite_spacing_and_case() {
    let conn = open_db_in_memory().unwrap();
    let owner = Owner::new("sam@example.com", 1);
    SqliteOwnerRepository::try_new(&conn)
        .unwrap()
        .create_owner(&owner)
        .unwrap();
    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .create_dog(owner.id, DogDraft::named("Rex"))
        .unwrap();
    let vaccines = VaccineService::new(SqliteVaccineRepository::try_new(&conn).unwrap());

    let first = VaccineRecord::new(dog.id, "  Rabies   booster ", date(2022, 1, 1))
        .with_next_due(Some(date(2023, 1, 1)));
    assert_eq!(first.vaccine_name, "Rabies booster");
    vaccines.record_vaccine(&first).unwrap();

    // Fields are public, so the store must collapse spacing too.
    let mut renewal = VaccineRecord::new(dog.id, "rabies booster", date(2023, 1, 2))
        .with_next_due(Some(date(2026, 1, 2)));
    renewal.vaccine_name = "rabies \t booster".to_string();
    let renewal_id = vaccines.record_vaccine(&renewal).unwrap();

    assert_eq!(
        vaccines.get_vaccine(renewal_id).unwrap().vaccine_name,
        "rabies booster"
    );
    assert!(vaccines
        .list_overdue(owner.id, date(2024, 6, 1))
        .unwrap()
        .is_empty());
}
