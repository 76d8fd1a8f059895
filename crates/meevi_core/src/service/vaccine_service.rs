//! Vaccine records and schedule use-cases.

use super::{ServiceError, ServiceResult};
use crate::model::dog::Dog;
use crate::model::vaccine::VaccineRecord;
use crate::model::RecordId;
use crate::realtime::{publish_owned, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::DogRecordTable;
use crate::repo::vaccine_repo::VaccineRepository;
use crate::schedule::{summarize, vaccination_schedule, ScheduleItem, ScheduleSummary};
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;

/// Schedule view for one dog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogSchedule {
    pub dog_id: RecordId,
    pub age_months: Option<u32>,
    pub items: Vec<ScheduleItem>,
    pub summary: ScheduleSummary,
}

pub struct VaccineService<R: VaccineRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: VaccineRepository> VaccineService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn record_vaccine(&self, record: &VaccineRecord) -> ServiceResult<RecordId> {
        let id = self.repo.create_vaccine(record)?;
        info!(
            "event=vaccine_record module=service status=ok dog_id={} has_next_due={}",
            record.dog_id,
            record.next_due_date.is_some()
        );
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeAction::Insert, id, owner);
        Ok(id)
    }

    pub fn update_vaccine(&self, record: &VaccineRecord) -> ServiceResult<()> {
        self.repo.update_vaccine(record)?;
        let owner = self.dog_owner(record.dog_id)?;
        self.publish(ChangeAction::Update, record.id, owner);
        Ok(())
    }

    pub fn get_vaccine(&self, id: RecordId) -> ServiceResult<VaccineRecord> {
        self.repo.get_vaccine(id)?.ok_or(ServiceError::NotFound {
            entity: "vaccine record",
            id,
        })
    }

    pub fn list_for_dog(&self, dog_id: RecordId) -> ServiceResult<Vec<VaccineRecord>> {
        Ok(self.repo.list_for_dog(dog_id)?)
    }

    pub fn list_overdue(
        &self,
        owner_id: RecordId,
        today: NaiveDate,
    ) -> ServiceResult<Vec<VaccineRecord>> {
        Ok(self.repo.list_overdue(owner_id, today)?)
    }

    pub fn delete_vaccine(&self, id: RecordId) -> ServiceResult<()> {
        let owner = match self.feed {
            Some(_) => self.repo.owner_of_row(DogRecordTable::Vaccines, id)?,
            None => None,
        };
        self.repo.delete_vaccine(id)?;
        self.publish(ChangeAction::Delete, id, owner);
        Ok(())
    }

    /// Recommended schedule for `dog` with completion derived from its records.
    pub fn schedule_for(&self, dog: &Dog, today: NaiveDate) -> ServiceResult<DogSchedule> {
        let recorded = self.repo.list_for_dog(dog.id)?;
        let items = vaccination_schedule(dog.birth_date, &recorded, today);
        let summary = summarize(&items);
        Ok(DogSchedule {
            dog_id: dog.id,
            age_months: dog
                .birth_date
                .map(|birth| crate::schedule::age_in_months(birth, today)),
            items,
            summary,
        })
    }

    fn dog_owner(&self, dog_id: RecordId) -> ServiceResult<Option<RecordId>> {
        match self.feed {
            Some(_) => Ok(self.repo.owner_of_dog(dog_id)?),
            None => Ok(None),
        }
    }

    fn publish(&self, action: ChangeAction, id: RecordId, owner: Option<RecordId>) {
        publish_owned(
            self.feed.as_deref(),
            ChangeEvent::new(ChangeTable::Vaccines, action, id),
            owner,
        );
    }
}
