//! Feeding, bath and exercise logging use-cases.

use super::ServiceResult;
use crate::model::care::{BathRecord, ExerciseRecord, FeedingRecord};
use crate::model::RecordId;
use crate::realtime::{publish_owned, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::care_repo::{CareListQuery, CareRepository};
use crate::repo::DogRecordTable;
use log::debug;
use std::sync::Arc;

pub struct CareService<R: CareRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: CareRepository> CareService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn log_feeding(&self, record: &FeedingRecord) -> ServiceResult<RecordId> {
        let id = self.repo.create_feeding(record)?;
        debug!("event=feeding_log module=service status=ok dog_id={}", record.dog_id);
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Feeding, ChangeAction::Insert, id, owner);
        Ok(id)
    }

    pub fn update_feeding(&self, record: &FeedingRecord) -> ServiceResult<()> {
        self.repo.update_feeding(record)?;
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Feeding, ChangeAction::Update, record.id, owner);
        Ok(())
    }

    pub fn list_feedings(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> ServiceResult<Vec<FeedingRecord>> {
        Ok(self.repo.list_feedings(dog_id, query)?)
    }

    pub fn delete_feeding(&self, id: RecordId) -> ServiceResult<()> {
        let owner = self.row_owner(DogRecordTable::Feeding, id)?;
        self.repo.delete_feeding(id)?;
        self.publish(ChangeTable::Feeding, ChangeAction::Delete, id, owner);
        Ok(())
    }

    pub fn log_bath(&self, record: &BathRecord) -> ServiceResult<RecordId> {
        let id = self.repo.create_bath(record)?;
        debug!("event=bath_log module=service status=ok dog_id={}", record.dog_id);
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Baths, ChangeAction::Insert, id, owner);
        Ok(id)
    }

    pub fn update_bath(&self, record: &BathRecord) -> ServiceResult<()> {
        self.repo.update_bath(record)?;
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Baths, ChangeAction::Update, record.id, owner);
        Ok(())
    }

    pub fn list_baths(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> ServiceResult<Vec<BathRecord>> {
        Ok(self.repo.list_baths(dog_id, query)?)
    }

    pub fn delete_bath(&self, id: RecordId) -> ServiceResult<()> {
        let owner = self.row_owner(DogRecordTable::Baths, id)?;
        self.repo.delete_bath(id)?;
        self.publish(ChangeTable::Baths, ChangeAction::Delete, id, owner);
        Ok(())
    }

    pub fn log_exercise(&self, record: &ExerciseRecord) -> ServiceResult<RecordId> {
        let id = self.repo.create_exercise(record)?;
        debug!(
            "event=exercise_log module=service status=ok dog_id={} minutes={}",
            record.dog_id, record.duration_minutes
        );
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Exercise, ChangeAction::Insert, id, owner);
        Ok(id)
    }

    pub fn update_exercise(&self, record: &ExerciseRecord) -> ServiceResult<()> {
        self.repo.update_exercise(record)?;
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeTable::Exercise, ChangeAction::Update, record.id, owner);
        Ok(())
    }

    pub fn list_exercises(
        &self,
        dog_id: RecordId,
        query: &CareListQuery,
    ) -> ServiceResult<Vec<ExerciseRecord>> {
        Ok(self.repo.list_exercises(dog_id, query)?)
    }

    pub fn delete_exercise(&self, id: RecordId) -> ServiceResult<()> {
        let owner = self.row_owner(DogRecordTable::Exercise, id)?;
        self.repo.delete_exercise(id)?;
        self.publish(ChangeTable::Exercise, ChangeAction::Delete, id, owner);
        Ok(())
    }

    // Lookups are skipped when nobody listens.
    fn dog_owner(&self, dog_id: RecordId) -> ServiceResult<Option<RecordId>> {
        if self.feed.is_none() {
            return Ok(None);
        }
        Ok(self.repo.owner_of_dog(dog_id)?)
    }

    fn row_owner(&self, table: DogRecordTable, id: RecordId) -> ServiceResult<Option<RecordId>> {
        if self.feed.is_none() {
            return Ok(None);
        }
        Ok(self.repo.owner_of_row(table, id)?)
    }

    fn publish(
        &self,
        table: ChangeTable,
        action: ChangeAction,
        id: RecordId,
        owner: Option<RecordId>,
    ) {
        publish_owned(self.feed.as_deref(), ChangeEvent::new(table, action, id), owner);
    }
}
