//! HTTP service for Meevi: reminder checks, photo uploads and photo hosting.

pub mod config;
pub mod error;
pub mod handlers;
pub mod photo_store;

use crate::error::ApiError;
use crate::handlers::{CheckRequest, PhotoUploadRequest};
use crate::photo_store::PhotoStore;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use meevi_core::ReminderClock;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Base64 of a 5 MiB photo plus JSON framing; larger bodies get a JSON 413.
const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    photos: Arc<PhotoStore>,
}

impl AppState {
    pub fn new(conn: Connection, photos: PhotoStore) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            photos: Arc::new(photos),
        }
    }

    /// Runs `f` with the shared connection on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &PhotoStore) -> Result<T, ApiError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let photos = Arc::clone(&self.photos);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::internal("database lock poisoned"))?;
            f(&conn, &photos)
        })
        .await
        .map_err(|err| ApiError::internal(format!("request task failed: {err}")))?
    }
}

pub fn router(state: AppState) -> Router {
    let photo_root = state.photos.root().to_path_buf();
    Router::new()
        .route("/health", get(health))
        .route("/api/notifications/check", post(check_notifications))
        .route("/api/photos", post(upload_photo))
        .nest_service("/photos", ServeDir::new(photo_root))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": meevi_core::core_version()}))
}

async fn check_notifications(
    State(state): State<AppState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<handlers::CheckResponse>, ApiError> {
    let Json(request) = body.map_err(ApiError::from)?;
    let response = state
        .with_db(move |conn, _| {
            handlers::check_notifications(conn, &request, ReminderClock::system())
        })
        .await?;
    Ok(Json(response))
}

async fn upload_photo(
    State(state): State<AppState>,
    body: Result<Json<PhotoUploadRequest>, JsonRejection>,
) -> Result<Json<handlers::PhotoUploadResponse>, ApiError> {
    let Json(request) = body.map_err(ApiError::from)?;
    let response = state
        .with_db(move |conn, photos| handlers::upload_photo(conn, photos, &request))
        .await?;
    Ok(Json(response))
}
