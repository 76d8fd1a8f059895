use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use meevi_core::model::dog::DogDraft;
use meevi_core::open_db_in_memory;
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::owner_repo::SqliteOwnerRepository;
use meevi_core::service::account_service::AccountService;
use meevi_core::service::dog_service::DogService;
use meevi_server::photo_store::PhotoStore;
use meevi_server::{router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

struct Fixture {
    router: Router,
    owner_id: Uuid,
    dog_id: Uuid,
    _photos: TempDir,
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let owner = AccountService::new(SqliteOwnerRepository::try_new(&conn).unwrap())
        .register_owner("kim@example.com", None)
        .unwrap();
    let dog = DogService::new(SqliteDogRepository::try_new(&conn).unwrap())
        .create_dog(owner.id, DogDraft::named("Pip"))
        .unwrap();
    let photos = tempfile::tempdir().unwrap();
    let store = PhotoStore::new(photos.path(), "/photos");
    Fixture {
        router: router(AppState::new(conn, store)),
        owner_id: owner.id,
        dog_id: dog.id,
        _photos: photos,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let fx = fixture();
    let (status, body) = call(&fx.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], meevi_core::core_version());
}

#[tokio::test]
async fn check_endpoint_maps_errors_to_status_codes() {
    let fx = fixture();

    let (status, body) = call(
        &fx.router,
        "POST",
        "/api/notifications/check",
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["success"], false);

    let (status, body) = call(
        &fx.router,
        "POST",
        "/api/notifications/check",
        Some(json!({"user_id": Uuid::new_v4()}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(as_json(&body)["error"].is_string());

    let (status, body) = call(
        &fx.router,
        "POST",
        "/api/notifications/check",
        Some(json!({"user_id": fx.owner_id}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["success"], true);
}

#[tokio::test]
async fn uploaded_photo_is_served_back() {
    let fx = fixture();
    let upload = json!({
        "dog_id": fx.dog_id,
        "file_name": "pip.jpg",
        "content_type": "image/jpeg",
        "data_base64": format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpeg-bytes")),
    });

    let (status, body) = call(&fx.router, "POST", "/api/photos", Some(upload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with(&format!("/photos/{}/{}/", fx.owner_id, fx.dog_id)));

    let (status, bytes) = call(&fx.router, "GET", &url, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"jpeg-bytes");
}

#[tokio::test]
async fn oversized_photo_is_rejected() {
    let fx = fixture();
    let upload = json!({
        "dog_id": fx.dog_id,
        "file_name": "big.png",
        "content_type": "image/png",
        "data_base64": STANDARD.encode(vec![0u8; 5 * 1024 * 1024 + 1]),
    });

    let (status, body) = call(&fx.router, "POST", "/api/photos", Some(upload.to_string())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(as_json(&body)["success"], false);
}

#[tokio::test]
async fn body_over_request_limit_is_payload_too_large() {
    let fx = fixture();
    let upload = json!({
        "dog_id": fx.dog_id,
        "file_name": "huge.jpg",
        "content_type": "image/jpeg",
        "data_base64": STANDARD.encode(vec![0u8; 7 * 1024 * 1024]),
    });

    let (status, body) = call(&fx.router, "POST", "/api/photos", Some(upload.to_string())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let body = as_json(&body);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn mismatched_file_name_is_rejected() {
    let fx = fixture();
    let upload = json!({
        "dog_id": fx.dog_id,
        "file_name": "pip.gif",
        "content_type": "image/png",
        "data_base64": STANDARD.encode(b"png-bytes"),
    });

    let (status, body) = call(&fx.router, "POST", "/api/photos", Some(upload.to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["success"], false);
}
