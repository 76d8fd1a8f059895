//! Cloud sync between local-only collections and the hosted platform.
//!
//! # Responsibility
//! - Define the remote row store seam (`RemoteStore`).
//! - Copy local collections up (`push`) and down (`pull`).
//!
//! # Invariants
//! - No conflict resolution: the destination is overwritten.
//! - The first failing collection aborts the run and is named in the error.

pub mod cloud_sync;
pub mod remote;

pub use cloud_sync::{CloudSyncService, SyncDirection, SyncError, SyncErrorKind, SyncReport};
pub use remote::{MemoryRemoteStore, RemoteError, RemoteStore, SqliteRemoteStore};
