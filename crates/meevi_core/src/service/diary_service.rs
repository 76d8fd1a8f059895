//! Diary timeline use-cases.

use super::{ServiceError, ServiceResult};
use crate::model::care::DiaryEntry;
use crate::model::RecordId;
use crate::realtime::{publish_owned, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::diary_repo::{normalize_diary_limit, DiaryListQuery, DiaryRepository};
use crate::repo::DogRecordTable;
use std::sync::Arc;

/// Page of diary entries plus the limit that was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryPage {
    pub items: Vec<DiaryEntry>,
    pub applied_limit: u32,
}

pub struct DiaryService<R: DiaryRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: DiaryRepository> DiaryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn add_entry(&self, entry: &DiaryEntry) -> ServiceResult<DiaryEntry> {
        let id = self.repo.create_entry(entry)?;
        let owner = self.dog_owner(entry.dog_id)?;
        self.publish(ChangeAction::Insert, id, owner);
        self.repo
            .get_entry(id)?
            .ok_or(ServiceError::InconsistentState(
                "created diary entry not found in read-back",
            ))
    }

    pub fn update_entry(&self, entry: &DiaryEntry) -> ServiceResult<()> {
        self.repo.update_entry(entry)?;
        let owner = self.dog_owner(entry.dog_id)?;
        self.publish(ChangeAction::Update, entry.id, owner);
        Ok(())
    }

    pub fn list_entries(
        &self,
        dog_id: RecordId,
        query: DiaryListQuery,
    ) -> ServiceResult<DiaryPage> {
        let applied_limit = normalize_diary_limit(query.limit);
        let query = DiaryListQuery {
            limit: Some(applied_limit),
            ..query
        };
        let items = self.repo.list_entries(dog_id, &query)?;
        Ok(DiaryPage {
            items,
            applied_limit,
        })
    }

    pub fn delete_entry(&self, id: RecordId) -> ServiceResult<()> {
        let owner = match self.feed {
            Some(_) => self.repo.owner_of_row(DogRecordTable::Diary, id)?,
            None => None,
        };
        self.repo.delete_entry(id)?;
        self.publish(ChangeAction::Delete, id, owner);
        Ok(())
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
            ChangeEvent::new(ChangeTable::Diary, action, id),
            owner,
        );
    }
}
