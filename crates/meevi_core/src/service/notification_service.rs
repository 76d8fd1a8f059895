//! Notification inbox use-cases.

use super::ServiceResult;
use crate::model::notification::Notification;
use crate::model::RecordId;
use crate::realtime::{publish_owned, ChangeAction, ChangeEvent, ChangeFeed, ChangeTable};
use crate::repo::notification_repo::{NotificationListQuery, NotificationRepository};
use std::sync::Arc;

/// Inbox snapshot returned to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbox {
    pub items: Vec<Notification>,
    pub unread_count: u32,
}

pub struct NotificationService<R: NotificationRepository> {
    repo: R,
    feed: Option<Arc<ChangeFeed>>,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    pub fn with_change_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn inbox(&self, owner_id: RecordId, query: &NotificationListQuery) -> ServiceResult<Inbox> {
        let items = self.repo.list_notifications(owner_id, query)?;
        let unread_count = self.repo.unread_count(owner_id)?;
        Ok(Inbox {
            items,
            unread_count,
        })
    }

    pub fn unread_count(&self, owner_id: RecordId) -> ServiceResult<u32> {
        Ok(self.repo.unread_count(owner_id)?)
    }

    pub fn mark_read(&self, id: RecordId) -> ServiceResult<()> {
        let owner = self.owner_of(id)?;
        self.repo.mark_read(id)?;
        self.publish(ChangeAction::Update, id, owner);
        Ok(())
    }

    /// Marks every unread notification read; returns how many changed.
    ///
    /// Publishes one `Bulk` event keyed by the owner id; inbox views re-fetch.
    pub fn mark_all_read(&self, owner_id: RecordId) -> ServiceResult<u32> {
        let changed = self.repo.mark_all_read(owner_id)?;
        if changed > 0 {
            self.publish(ChangeAction::Bulk, owner_id, Some(owner_id));
        }
        Ok(changed)
    }

    pub fn delete(&self, id: RecordId) -> ServiceResult<()> {
        let owner = self.owner_of(id)?;
        self.repo.delete_notification(id)?;
        self.publish(ChangeAction::Delete, id, owner);
        Ok(())
    }

    fn owner_of(&self, id: RecordId) -> ServiceResult<Option<RecordId>> {
        if self.feed.is_none() {
            return Ok(None);
        }
        Ok(self
            .repo
            .get_notification(id)?
            .map(|notification| notification.owner_id))
    }

    fn publish(&self, action: ChangeAction, id: RecordId, owner: Option<RecordId>) {
        publish_owned(
            self.feed.as_deref(),
            ChangeEvent::new(ChangeTable::Notifications, action, id),
            owner,
        );
    }
}
