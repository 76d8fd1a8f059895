//! Push/pull of local-only collections.

use super::remote::{RemoteError, RemoteStore};
use crate::local::{LocalCollection, LocalStore};
use crate::model::RecordId;
use crate::repo::RepoError;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Push,
    Pull,
}

impl SyncDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
        }
    }
}

#[derive(Debug)]
pub enum SyncErrorKind {
    Local(RepoError),
    Remote(RemoteError),
}

/// Sync failure for one collection; later collections were not attempted.
#[derive(Debug)]
pub struct SyncError {
    pub collection: LocalCollection,
    pub direction: SyncDirection,
    pub kind: SyncErrorKind,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let cause: &dyn Display = match &self.kind {
            SyncErrorKind::Local(err) => err,
            SyncErrorKind::Remote(err) => err,
        };
        write!(
            f,
            "{} of {} failed: {cause}",
            self.direction.as_str(),
            self.collection.as_str()
        )
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            SyncErrorKind::Local(err) => Some(err),
            SyncErrorKind::Remote(err) => Some(err),
        }
    }
}

/// Per-collection row counts of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub collections: Vec<(LocalCollection, usize)>,
}

impl SyncReport {
    pub fn total_rows(&self) -> usize {
        self.collections.iter().map(|(_, rows)| rows).sum()
    }

    pub fn rows_for(&self, collection: LocalCollection) -> Option<usize> {
        self.collections
            .iter()
            .find(|(name, _)| *name == collection)
            .map(|(_, rows)| *rows)
    }
}

pub struct CloudSyncService<'conn, S: RemoteStore> {
    local: LocalStore<'conn>,
    remote: S,
}

impl<'conn, S: RemoteStore> CloudSyncService<'conn, S> {
    pub fn new(local: LocalStore<'conn>, remote: S) -> Self {
        Self { local, remote }
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Uploads every local collection of `owner_id`.
    pub fn push(&self, owner_id: RecordId) -> Result<SyncReport, SyncError> {
        self.run(SyncDirection::Push, owner_id, |collection| {
            let rows = self
                .local
                .list_raw(collection, owner_id)
                .map_err(SyncErrorKind::Local)?;
            self.remote
                .upsert_rows(collection.remote_table(), owner_id, &rows)
                .map_err(SyncErrorKind::Remote)
        })
    }

    /// Replaces every local collection of `owner_id` with the remote rows.
    pub fn pull(&self, owner_id: RecordId) -> Result<SyncReport, SyncError> {
        self.run(SyncDirection::Pull, owner_id, |collection| {
            let rows = self
                .remote
                .fetch_rows(collection.remote_table(), owner_id)
                .map_err(SyncErrorKind::Remote)?;
            self.local
                .replace_raw(collection, owner_id, &rows)
                .map_err(SyncErrorKind::Local)?;
            Ok(rows.len())
        })
    }

    fn run<F>(
        &self,
        direction: SyncDirection,
        owner_id: RecordId,
        mut step: F,
    ) -> Result<SyncReport, SyncError>
    where
        F: FnMut(LocalCollection) -> Result<usize, SyncErrorKind>,
    {
        let started_at = Instant::now();
        let mut report = SyncReport::default();
        for collection in LocalCollection::ALL {
            match step(collection) {
                Ok(rows) => report.collections.push((collection, rows)),
                Err(kind) => {
                    error!(
                        "event=cloud_sync module=sync status=error direction={} owner_id={} collection={}",
                        direction.as_str(),
                        owner_id,
                        collection.as_str()
                    );
                    return Err(SyncError {
                        collection,
                        direction,
                        kind,
                    });
                }
            }
        }
        info!(
            "event=cloud_sync module=sync status=ok direction={} owner_id={} rows={} duration_ms={}",
            direction.as_str(),
            owner_id,
            report.total_rows(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}
