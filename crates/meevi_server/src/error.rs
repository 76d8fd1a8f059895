//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"success": false, "error": message}`.

use crate::photo_store::PhotoError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use meevi_core::{DbError, RepoError, ServiceError};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                "event=http_error module=server status=error code={} message={}",
                self.status.as_u16(),
                self.message
            );
        }
        (
            self.status,
            Json(json!({"success": false, "error": self.message})),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match &value {
            ServiceError::NotFound { .. } => Self::not_found(value.to_string()),
            ServiceError::Validation(_) | ServiceError::OnboardingRequiresDog(_) => {
                Self::bad_request(value.to_string())
            }
            ServiceError::Conflict(_) => Self {
                status: StatusCode::CONFLICT,
                message: value.to_string(),
            },
            ServiceError::Repo(_) | ServiceError::InconsistentState(_) => {
                Self::internal(value.to_string())
            }
        }
    }
}

/// Body-limit overruns keep their 413; every other malformed body is a 400.
impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        let status = match value.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: value.body_text(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        ServiceError::from(value).into()
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::internal(value.to_string())
    }
}

impl From<PhotoError> for ApiError {
    fn from(value: PhotoError) -> Self {
        match value {
            PhotoError::Io(_) => Self::internal(value.to_string()),
            PhotoError::TooLarge { .. } => Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: value.to_string(),
            },
            _ => Self::bad_request(value.to_string()),
        }
    }
}
