//! Dog profile use-cases.
//!
//! # Invariants
//! - Profiles are created and edited from `DogDraft` form input only.
//! - Every successful write publishes one change event.

use super::{ServiceError, ServiceResult};
use crate::clock::now_epoch_ms;
use crate::model::dog::{Dog, DogDraft};
use crate::model::RecordId;
use crate::realtime::{publish_to, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::dog_repo::DogRepository;
use log::info;
use std::sync::Arc;

pub struct DogService<R: DogRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: DogRepository> DogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Creates one dog profile and returns the stored record.
    pub fn create_dog(&self, owner_id: RecordId, draft: DogDraft) -> ServiceResult<Dog> {
        let dog = Dog::from_draft(owner_id, draft, now_epoch_ms());
        self.repo.create_dog(&dog)?;
        info!(
            "event=dog_create module=service status=ok owner_id={} dog_id={}",
            owner_id, dog.id
        );
        self.publish(ChangeAction::Insert, &dog);
        Ok(dog)
    }

    /// Replaces editable profile fields.
    pub fn update_dog(&self, id: RecordId, draft: DogDraft) -> ServiceResult<Dog> {
        let mut dog = self.get_dog(id)?;
        dog.apply_draft(draft);
        dog.updated_at = now_epoch_ms().max(dog.updated_at);
        self.repo.update_dog(&dog)?;
        self.publish(ChangeAction::Update, &dog);
        Ok(dog)
    }

    pub fn get_dog(&self, id: RecordId) -> ServiceResult<Dog> {
        self.repo
            .get_dog(id)?
            .ok_or(ServiceError::NotFound { entity: "dog", id })
    }

    pub fn list_dogs(&self, owner_id: RecordId) -> ServiceResult<Vec<Dog>> {
        Ok(self.repo.list_dogs(owner_id)?)
    }

    /// Points the profile at an uploaded photo.
    pub fn set_photo_url(&self, id: RecordId, photo_url: &str) -> ServiceResult<Dog> {
        self.repo.set_photo_url(id, photo_url, now_epoch_ms())?;
        let dog = self.get_dog(id)?;
        self.publish(ChangeAction::Update, &dog);
        Ok(dog)
    }

    /// Deletes a dog and, through cascades, all of its records.
    pub fn delete_dog(&self, id: RecordId) -> ServiceResult<()> {
        let dog = self.get_dog(id)?;
        self.repo.delete_dog(id)?;
        info!(
            "event=dog_delete module=service status=ok owner_id={} dog_id={}",
            dog.owner_id, id
        );
        self.publish(ChangeAction::Delete, &dog);
        Ok(())
    }

    fn publish(&self, action: ChangeAction, dog: &Dog) {
        publish_to(
            self.feed.as_deref(),
            ChangeEvent::new(ChangeTable::Dogs, action, dog.id).for_owner(dog.owner_id),
        );
    }
}
