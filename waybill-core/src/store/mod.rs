//! Storage seams for trips, profiles and ranking snapshots.
//!
//! The trip store is append-only from this crate's point of view. Stores
//! may be backed by memory, a JSON file or a database; callers only see
//! the traits below.

mod json_file;
mod memory;

pub use json_file::{FileSubmissionLock, JsonFileProfileRepository, JsonFileTripRepository};
pub use memory::{
    MemoryProfileRepository, MemorySnapshotRepository, MemoryTripRepository,
};

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, WaybillError};
use crate::model::{ProfileRecord, TripRecord};
use crate::snapshot::RankingSnapshot;

/// Persistent collection of trip records.
#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Snapshot of every stored trip.
    async fn list_all(&self) -> Result<Vec<TripRecord>>;

    /// Persist one new trip.
    ///
    /// Re-checks the proofs against what is stored: a fingerprint already
    /// present fails with [`WaybillError::DuplicateProof`], a reused trip id
    /// with [`WaybillError::ConcurrencyConflict`]. A writer that bypasses
    /// the submission lock can therefore never store a reused proof.
    async fn append(&self, trip: TripRecord) -> Result<()>;
}

/// Read-only view of community profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<ProfileRecord>>;

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>> {
        Ok(self.list_all().await?.into_iter().find(|p| p.id == id))
    }
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn store(&self, snapshot: RankingSnapshot) -> Result<()>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<RankingSnapshot>>;

    async fn get(&self, id: &str) -> Result<Option<RankingSnapshot>>;

    /// Returns whether a snapshot was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Held for the whole check-then-append window of a submission.
pub struct SubmissionGuard {
    _held: Box<dyn Any + Send + Sync>,
}

impl SubmissionGuard {
    pub fn new<T: Send + Sync + 'static>(held: T) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for SubmissionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SubmissionGuard")
    }
}

/// Serializes submissions that share one trip store.
#[async_trait]
pub trait SubmissionLock: Send + Sync {
    async fn acquire(&self) -> Result<SubmissionGuard>;
}

/// Process-local submission lock.
///
/// Stores shared between processes need [`FileSubmissionLock`] instead.
#[derive(Debug, Clone, Default)]
pub struct LocalSubmissionLock {
    inner: Arc<Mutex<()>>,
}

impl LocalSubmissionLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionLock for LocalSubmissionLock {
    async fn acquire(&self) -> Result<SubmissionGuard> {
        let guard = self.inner.clone().lock_owned().await;
        Ok(SubmissionGuard::new(guard))
    }
}

/// Reject `trip` if it collides with anything already in `existing`.
pub(crate) fn check_append(existing: &[TripRecord], trip: &TripRecord) -> Result<()> {
    if existing.iter().any(|t| t.id == trip.id) {
        return Err(WaybillError::ConcurrencyConflict(format!(
            "trip id {} already stored",
            trip.id
        )));
    }
    for fingerprint in trip.fingerprints() {
        if let Some(clash) = existing.iter().find(|t| t.uses_fingerprint(fingerprint)) {
            return Err(WaybillError::DuplicateProof {
                fingerprint: fingerprint.to_string(),
                trip_id: clash.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_local_lock_is_exclusive() {
        let lock = LocalSubmissionLock::new();
        let guard = lock.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(20), lock.acquire()).await;
        assert!(waiting.is_err(), "second acquire must wait for the first guard");

        drop(guard);
        assert!(lock.acquire().await.is_ok());
    }
}
