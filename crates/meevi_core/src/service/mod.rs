//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Publish change events after successful writes.
//! - Keep UI/FFI/HTTP layers decoupled from storage details.

use crate::model::validation::ValidationError;
use crate::model::RecordId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_service;
pub mod care_service;
pub mod diary_service;
pub mod dog_service;
pub mod notification_service;
pub mod onboarding_service;
pub mod preferences_service;
pub mod vaccine_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by all use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Input failed record validation.
    Validation(ValidationError),
    /// Target record does not exist.
    NotFound {
        entity: &'static str,
        id: RecordId,
    },
    /// Write conflicts with an existing record.
    Conflict(String),
    /// Owner tried to finish onboarding without any dog profile.
    OnboardingRequiresDog(RecordId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::OnboardingRequiresDog(owner_id) => write!(
                f,
                "owner {owner_id} must add at least one dog before finishing onboarding"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl ServiceError {
    /// Stable machine-readable code for FFI envelopes and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::OnboardingRequiresDog(_) => "onboarding_requires_dog",
            Self::Repo(_) => "storage_error",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}
