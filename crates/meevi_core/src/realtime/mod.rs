//! In-process change feed for realtime list refreshes.
//!
//! # Responsibility
//! - Fan out row-level change events to subscribed views.
//! - Let views re-fetch instead of diffing payloads.
//!
//! # Invariants
//! - Publishing never blocks and never fails.
//! - Dropped subscriptions are pruned on every subscribe, publish and count.
//! - An owner-filtered subscription only sees events tagged with that owner.
//! - Events carry identifiers only, never record contents.

use crate::model::RecordId;
use log::debug;
use std::ops::Deref;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, Weak};

/// Table whose rows changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTable {
    Dogs,
    Feeding,
    Baths,
    Exercise,
    Diary,
    Vaccines,
    Notifications,
    Preferences,
    LocalItems,
}

impl ChangeTable {
    pub const ALL: [ChangeTable; 9] = [
        ChangeTable::Dogs,
        ChangeTable::Feeding,
        ChangeTable::Baths,
        ChangeTable::Exercise,
        ChangeTable::Diary,
        ChangeTable::Vaccines,
        ChangeTable::Notifications,
        ChangeTable::Preferences,
        ChangeTable::LocalItems,
    ];

    /// Matches the names returned by `as_str`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == value.trim())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dogs => "dogs",
            Self::Feeding => "feeding_records",
            Self::Baths => "bath_records",
            Self::Exercise => "exercise_records",
            Self::Diary => "diary_entries",
            Self::Vaccines => "vaccine_records",
            Self::Notifications => "notifications",
            Self::Preferences => "user_preferences",
            Self::LocalItems => "local_items",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
    /// Several rows of the owner's table changed at once; `record_id` is the owner id.
    Bulk,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Bulk => "bulk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub action: ChangeAction,
    pub record_id: RecordId,
    /// Owning account; owner-filtered views never see untagged events.
    pub owner_id: Option<RecordId>,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, action: ChangeAction, record_id: RecordId) -> Self {
        Self {
            table,
            action,
            record_id,
            owner_id: None,
        }
    }

    pub fn for_owner(mut self, owner_id: RecordId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

/// Subscription filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    pub tables: Vec<ChangeTable>,
    pub owner_id: Option<RecordId>,
}

impl ChangeFilter {
    pub fn tables(tables: impl IntoIterator<Item = ChangeTable>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
            owner_id: None,
        }
    }

    pub fn owner(mut self, owner_id: RecordId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        let table_ok = self.tables.is_empty() || self.tables.contains(&event.table);
        let owner_ok = match self.owner_id {
            Some(wanted) => event.owner_id == Some(wanted),
            None => true,
        };
        table_ok && owner_ok
    }
}

/// Receiving end of a subscription; dropping it unsubscribes.
pub struct Subscription {
    receiver: Receiver<ChangeEvent>,
    _alive: Arc<()>,
}

impl Deref for Subscription {
    type Target = Receiver<ChangeEvent>;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

struct Subscriber {
    filter: ChangeFilter,
    sender: Sender<ChangeEvent>,
    alive: Weak<()>,
}

impl Subscriber {
    fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

#[derive(Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let (sender, receiver) = channel();
        let alive = Arc::new(());
        let mut guard = self.lock();
        guard.retain(Subscriber::is_alive);
        guard.push(Subscriber {
            filter,
            sender,
            alive: Arc::downgrade(&alive),
        });
        Subscription {
            receiver,
            _alive: alive,
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let mut guard = self.lock();
        guard.retain(|subscriber| {
            if !subscriber.is_alive() {
                return false;
            }
            if !subscriber.filter.matches(&event) {
                return true;
            }
            subscriber.sender.send(event.clone()).is_ok()
        });
        debug!(
            "event=change_publish module=realtime table={} action={:?} subscribers={}",
            event.table.as_str(),
            event.action,
            guard.len()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        let mut guard = self.lock();
        guard.retain(Subscriber::is_alive);
        guard.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Publishes through an optional feed; services hold `Option<Arc<ChangeFeed>>`.
pub(crate) fn publish_to(feed: Option<&ChangeFeed>, event: ChangeEvent) {
    if let Some(feed) = feed {
        feed.publish(event);
    }
}

/// Like `publish_to`, tagging the event with its owner when resolved.
pub(crate) fn publish_owned(
    feed: Option<&ChangeFeed>,
    event: ChangeEvent,
    owner_id: Option<RecordId>,
) {
    let event = match owner_id {
        Some(owner_id) => event.for_owner(owner_id),
        None => event,
    };
    publish_to(feed, event);
}

#[cfg(test)]
mod tests {
    use super::{ChangeAction, ChangeEvent, ChangeFeed, ChangeFilter, ChangeTable};
    use uuid::Uuid;

    #[test]
    fn filtered_subscriber_only_sees_matching_tables() {
        let feed = ChangeFeed::new();
        let dogs = feed.subscribe(ChangeFilter::tables([ChangeTable::Dogs]));
        let all = feed.subscribe(ChangeFilter::default());

        feed.publish(ChangeEvent::new(
            ChangeTable::Feeding,
            ChangeAction::Insert,
            Uuid::new_v4(),
        ));
        let dog_id = Uuid::new_v4();
        feed.publish(ChangeEvent::new(ChangeTable::Dogs, ChangeAction::Update, dog_id));

        let seen: Vec<_> = dogs.try_iter().collect();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].record_id, dog_id);
        assert_eq!(all.try_iter().count(), 2);
    }

    #[test]
    fn owner_filter_skips_other_owners_and_untagged_events() {
        let feed = ChangeFeed::new();
        let owner = Uuid::new_v4();
        let rx = feed.subscribe(ChangeFilter::default().owner(owner));

        feed.publish(
            ChangeEvent::new(ChangeTable::Dogs, ChangeAction::Insert, Uuid::new_v4())
                .for_owner(Uuid::new_v4()),
        );
        feed.publish(ChangeEvent::new(
            ChangeTable::Feeding,
            ChangeAction::Insert,
            Uuid::new_v4(),
        ));
        feed.publish(
            ChangeEvent::new(ChangeTable::Dogs, ChangeAction::Insert, Uuid::new_v4())
                .for_owner(owner),
        );
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe(ChangeFilter::default());
        assert_eq!(feed.subscriber_count(), 1);
        drop(rx);

        feed.publish(ChangeEvent::new(
            ChangeTable::Dogs,
            ChangeAction::Delete,
            Uuid::new_v4(),
        ));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn dropped_narrow_subscription_is_pruned_without_matching_traffic() {
        let feed = ChangeFeed::new();
        let narrow = feed.subscribe(ChangeFilter::tables([ChangeTable::Preferences]));
        let _wide = feed.subscribe(ChangeFilter::default());
        drop(narrow);

        feed.publish(ChangeEvent::new(
            ChangeTable::Dogs,
            ChangeAction::Insert,
            Uuid::new_v4(),
        ));
        assert_eq!(feed.subscriber_count(), 1);

        let other = feed.subscribe(ChangeFilter::tables([ChangeTable::Diary]));
        drop(other);
        assert_eq!(feed.subscriber_count(), 1);
    }
}
