//! Domain records for dogs, care routines, reminders and local collections.
//!
//! # Responsibility
//! - Define canonical record shapes shared by repositories, services and FFI.
//! - Enforce field-level invariants through `validate()`.
//!
//! # Invariants
//! - Every record is identified by a non-nil UUID.
//! - Timestamps are epoch milliseconds; calendar dates are `NaiveDate`.

pub mod calendar;
pub mod care;
pub mod dog;
pub mod essentials;
pub mod notification;
pub mod owner;
pub mod preferences;
pub mod vaccine;
pub mod validation;

/// Stable identifier type for every Meevi record.
pub type RecordId = uuid::Uuid;
