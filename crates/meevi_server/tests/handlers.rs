use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use meevi_core::model::dog::DogDraft;
use meevi_core::model::notification::NotificationKind;
use meevi_core::open_db_in_memory;
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::owner_repo::SqliteOwnerRepository;
use meevi_core::service::account_service::AccountService;
use meevi_core::service::dog_service::DogService;
use meevi_core::ReminderClock;
use meevi_server::handlers::{
    check_notifications, upload_photo, CheckRequest, PhotoUploadRequest,
};
use meevi_server::photo_store::PhotoStore;
use rusqlite::Connection;
use uuid::Uuid;

fn clock() -> ReminderClock {
    ReminderClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1_717_243_200_000)
}

fn seed(conn: &Connection) -> (Uuid, Uuid) {
    let owner = AccountService::new(SqliteOwnerRepository::try_new(conn).unwrap())
        .register_owner("sam@example.com", None)
        .unwrap();
    let mut draft = DogDraft::named("Rex");
    draft.birth_date = NaiveDate::from_ymd_opt(2020, 6, 1);
    let dog = DogService::new(SqliteDogRepository::try_new(conn).unwrap())
        .create_dog(owner.id, draft)
        .unwrap();
    (owner.id, dog.id)
}

#[test]
fn check_creates_then_skips_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let (owner_id, dog_id) = seed(&conn);
    let request = CheckRequest { user_id: owner_id };

    let first = check_notifications(&conn, &request, clock()).unwrap();
    assert!(first.success);
    assert_eq!(first.created, 2);
    let kinds: Vec<_> = first.notifications.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Feeding, NotificationKind::Birthday]);
    assert!(first.notifications.iter().all(|n| n.dog_id == Some(dog_id)));

    let second = check_notifications(&conn, &request, clock()).unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped_duplicates, 2);

    let body = serde_json::to_value(&second).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["notifications"], serde_json::json!([]));
}

#[test]
fn check_for_unknown_owner_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let err = check_notifications(
        &conn,
        &CheckRequest {
            user_id: Uuid::new_v4(),
        },
        clock(),
    )
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[test]
fn photo_upload_stores_file_and_updates_profile() {
    let conn = open_db_in_memory().unwrap();
    let (owner_id, dog_id) = seed(&conn);
    let dir = tempfile::tempdir().unwrap();
    let store = PhotoStore::new(dir.path(), "/photos");

    let response = upload_photo(
        &conn,
        &store,
        &PhotoUploadRequest {
            dog_id,
            file_name: "rex.png".to_string(),
            content_type: "image/png".to_string(),
            data_base64: STANDARD.encode(b"\x89PNG fake"),
        },
    )
    .unwrap();

    assert!(response.success);
    assert!(response.path.starts_with(&format!("{owner_id}/{dog_id}/")));
    assert_eq!(response.url, format!("/photos/{}", response.path));
    assert_eq!(
        std::fs::read(dir.path().join(&response.path)).unwrap(),
        b"\x89PNG fake"
    );

    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .get_dog(dog_id)
        .unwrap();
    assert_eq!(dog.photo_url.as_deref(), Some(response.url.as_str()));
}

#[test]
fn photo_upload_rejects_bad_type_and_unknown_dog() {
    let conn = open_db_in_memory().unwrap();
    let (_, dog_id) = seed(&conn);
    let dir = tempfile::tempdir().unwrap();
    let store = PhotoStore::new(dir.path(), "/photos");

    let bad_type = upload_photo(
        &conn,
        &store,
        &PhotoUploadRequest {
            dog_id,
            file_name: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data_base64: STANDARD.encode(b"%PDF"),
        },
    )
    .unwrap_err();
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);

    let unknown = upload_photo(
        &conn,
        &store,
        &PhotoUploadRequest {
            dog_id: Uuid::new_v4(),
            file_name: "x.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data_base64: STANDARD.encode(b"jpeg"),
        },
    )
    .unwrap_err();
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
