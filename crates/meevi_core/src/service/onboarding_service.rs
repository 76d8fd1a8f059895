//! Onboarding gate.
//!
//! # Invariants
//! - An owner leaves onboarding only with at least one dog profile.
//! - Completing onboarding twice is a no-op.

use super::{ServiceError, ServiceResult};
use crate::clock::now_epoch_ms;
use crate::model::RecordId;
use crate::repo::dog_repo::DogRepository;
use crate::repo::preferences_repo::PreferencesRepository;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingStatus {
    pub dog_count: u32,
    pub completed: bool,
}

impl OnboardingStatus {
    pub fn can_complete(&self) -> bool {
        self.dog_count > 0
    }
}

pub struct OnboardingService<D: DogRepository, P: PreferencesRepository> {
    dogs: D,
    preferences: P,
}

impl<D: DogRepository, P: PreferencesRepository> OnboardingService<D, P> {
    pub fn new(dogs: D, preferences: P) -> Self {
        Self { dogs, preferences }
    }

    pub fn status(&self, owner_id: RecordId) -> ServiceResult<OnboardingStatus> {
        Ok(OnboardingStatus {
            dog_count: self.dogs.count_for_owner(owner_id)?,
            completed: self.preferences.get_preferences(owner_id)?.onboarding_completed,
        })
    }

    pub fn complete(&self, owner_id: RecordId) -> ServiceResult<OnboardingStatus> {
        let status = self.status(owner_id)?;
        if status.completed {
            return Ok(status);
        }
        if !status.can_complete() {
            warn!("event=onboarding_complete module=service status=rejected owner_id={owner_id} reason=no_dogs");
            return Err(ServiceError::OnboardingRequiresDog(owner_id));
        }

        let mut preferences = self.preferences.get_preferences(owner_id)?;
        preferences.onboarding_completed = true;
        preferences.updated_at = now_epoch_ms();
        self.preferences.upsert_preferences(&preferences)?;
        info!("event=onboarding_complete module=service status=ok owner_id={owner_id}");
        Ok(OnboardingStatus {
            completed: true,
            ..status
        })
    }
}
