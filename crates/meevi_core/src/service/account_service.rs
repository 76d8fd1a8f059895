//! Owner account use-cases.
//!
//! Sign-in is handled by the identity provider; this service only keeps the
//! local owner row that anchors dogs and reminders.

use super::{ServiceError, ServiceResult};
use crate::clock::now_epoch_ms;
use crate::model::owner::Owner;
use crate::model::validation::clean_optional;
use crate::model::RecordId;
use crate::repo::owner_repo::OwnerRepository;
use log::info;

pub struct AccountService<R: OwnerRepository> {
    repo: R,
}

impl<R: OwnerRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers an owner; emails are unique case-insensitively.
    pub fn register_owner(
        &self,
        email: &str,
        display_name: Option<String>,
    ) -> ServiceResult<Owner> {
        if self.repo.find_by_email(email)?.is_some() {
            return Err(ServiceError::Conflict(
                "an owner with this email already exists".to_string(),
            ));
        }
        let mut owner = Owner::new(email, now_epoch_ms());
        owner.display_name = clean_optional(display_name);
        self.repo.create_owner(&owner)?;
        info!("event=owner_register module=service status=ok owner_id={}", owner.id);
        Ok(owner)
    }

    pub fn get_owner(&self, id: RecordId) -> ServiceResult<Owner> {
        self.repo
            .get_owner(id)?
            .ok_or(ServiceError::NotFound { entity: "owner", id })
    }

    pub fn find_by_email(&self, email: &str) -> ServiceResult<Option<Owner>> {
        Ok(self.repo.find_by_email(email)?)
    }
}
