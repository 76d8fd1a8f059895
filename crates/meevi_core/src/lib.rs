//! Core domain logic for Meevi.
//! This crate is the single source of truth for dog-care business rules.

pub mod calendar;
pub mod clock;
pub mod db;
pub mod local;
pub mod logging;
pub mod model;
pub mod realtime;
pub mod reminders;
pub mod repo;
pub mod schedule;
pub mod service;
pub mod stats;
pub mod sync;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_console_logging, init_logging, logging_status};
pub use model::RecordId;
pub use realtime::{ChangeEvent, ChangeFeed, ChangeFilter, Subscription};
pub use reminders::{ReminderClock, ReminderEvaluator, ReminderReport};
pub use repo::{RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
