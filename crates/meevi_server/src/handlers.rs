//! Endpoint logic, kept synchronous so it runs on the blocking pool and in tests.

use crate::error::ApiError;
use crate::photo_store::{check_file_name, decode_upload, extension_for, PhotoStore};
use log::info;
use meevi_core::model::notification::Notification;
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::owner_repo::SqliteOwnerRepository;
use meevi_core::service::account_service::AccountService;
use meevi_core::service::dog_service::DogService;
use meevi_core::{ReminderClock, ReminderEvaluator};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub created: usize,
    pub skipped_duplicates: u32,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUploadRequest {
    pub dog_id: Uuid,
    /// Client-side name; only its extension is checked against `content_type`.
    #[serde(default)]
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoUploadResponse {
    pub success: bool,
    pub url: String,
    pub path: String,
}

/// Runs the reminder rules for one owner.
pub fn check_notifications(
    conn: &Connection,
    request: &CheckRequest,
    clock: ReminderClock,
) -> Result<CheckResponse, ApiError> {
    let owner = AccountService::new(SqliteOwnerRepository::try_new(conn)?)
        .get_owner(request.user_id)?;
    let report = ReminderEvaluator::try_new(conn)?.run(owner.id, clock)?;
    Ok(CheckResponse {
        success: true,
        created: report.created.len(),
        skipped_duplicates: report.skipped_duplicates,
        notifications: report.created,
    })
}

/// Stores a dog photo and points the profile at it.
pub fn upload_photo(
    conn: &Connection,
    store: &PhotoStore,
    request: &PhotoUploadRequest,
) -> Result<PhotoUploadResponse, ApiError> {
    let extension = extension_for(&request.content_type)?;
    check_file_name(&request.file_name, extension)?;
    let bytes = decode_upload(&request.data_base64)?;

    let dogs = DogService::new(SqliteDogRepository::try_new(conn)?);
    let dog = dogs.get_dog(request.dog_id)?;
    let stored = store.save(dog.owner_id, dog.id, extension, &bytes)?;
    if let Err(err) = dogs.set_photo_url(dog.id, &stored.url) {
        store.remove(&stored.path);
        return Err(err.into());
    }

    info!(
        "event=photo_upload module=server status=ok dog_id={} bytes={} ext={}",
        dog.id,
        bytes.len(),
        extension
    );
    Ok(PhotoUploadResponse {
        success: true,
        url: stored.url,
        path: stored.path,
    })
}
