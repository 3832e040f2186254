//! In-memory stores for tests, demos and single-process deployments.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_append, ProfileRepository, SnapshotRepository, TripRepository};
use crate::error::Result;
use crate::model::{ProfileRecord, TripRecord};
use crate::snapshot::RankingSnapshot;

#[derive(Debug, Default)]
pub struct MemoryTripRepository {
    trips: RwLock<Vec<TripRecord>>,
}

impl MemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. from a restored backup.
    pub fn with_trips(trips: Vec<TripRecord>) -> Self {
        Self {
            trips: RwLock::new(trips),
        }
    }

    pub async fn len(&self) -> usize {
        self.trips.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trips.read().await.is_empty()
    }
}

#[async_trait]
impl TripRepository for MemoryTripRepository {
    async fn list_all(&self) -> Result<Vec<TripRecord>> {
        Ok(self.trips.read().await.clone())
    }

    async fn append(&self, trip: TripRecord) -> Result<()> {
        let mut trips = self.trips.write().await;
        check_append(&trips, &trip)?;
        trips.push(trip);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileRepository {
    profiles: RwLock<Vec<ProfileRecord>>,
}

impl MemoryProfileRepository {
    pub fn new(profiles: Vec<ProfileRecord>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
        }
    }

    /// Swap the whole collection, as the profile owner does on restore.
    pub async fn replace_all(&self, profiles: Vec<ProfileRecord>) {
        *self.profiles.write().await = profiles;
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn list_all(&self) -> Result<Vec<ProfileRecord>> {
        Ok(self.profiles.read().await.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    snapshots: RwLock<Vec<RankingSnapshot>>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshotRepository {
    async fn store(&self, snapshot: RankingSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.retain(|s| s.id != snapshot.id);
        snapshots.push(snapshot);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RankingSnapshot>> {
        let mut snapshots = self.snapshots.read().await.clone();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    async fn get(&self, id: &str) -> Result<Option<RankingSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut snapshots = self.snapshots.write().await;
        let before = snapshots.len();
        snapshots.retain(|s| s.id != id);
        Ok(snapshots.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::error::WaybillError;
    use crate::fingerprint::Fingerprint;
    use crate::model::{Amount, Platform, Segment};
    use crate::ranking::{RankAxis, RankingQuery};

    fn trip(id: &str, initial: &[u8], final_: &[u8]) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            driver_id: "u1".to_string(),
            driver_name: "Ana".to_string(),
            company_name: None,
            origin: "Belem".to_string(),
            destination: "Natal".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            value_cents: Amount::from_cents(500),
            platform: Platform::Toe3,
            segment: Segment::Truck,
            initial_fingerprint: Fingerprint::of(initial),
            final_fingerprint: Fingerprint::of(final_),
            initial_proof_ref: String::new(),
            final_proof_ref: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_then_list() {
        let repo = MemoryTripRepository::new();
        repo.append(trip("t_1", b"a", b"b")).await.unwrap();
        repo.append(trip("t_2", b"c", b"d")).await.unwrap();

        let ids: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t_1", "t_2"]);
    }

    #[tokio::test]
    async fn test_append_refuses_reused_proof_and_id() {
        let repo = MemoryTripRepository::with_trips(vec![trip("t_1", b"a", b"b")]);

        let err = repo.append(trip("t_2", b"x", b"a")).await.unwrap_err();
        assert!(matches!(err, WaybillError::DuplicateProof { ref trip_id, .. } if trip_id == "t_1"));

        let err = repo.append(trip("t_1", b"y", b"z")).await.unwrap_err();
        assert!(matches!(err, WaybillError::ConcurrencyConflict(_)));

        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshots_newest_first_and_delete() {
        let repo = MemorySnapshotRepository::new();
        let query = RankingQuery::new(RankAxis::Driver, Platform::Gto, Segment::Both);
        for (id, month) in [("snap_a", 1), ("snap_b", 3), ("snap_c", 2)] {
            let at = Utc.with_ymd_and_hms(2026, month, 1, 0, 0, 0).unwrap();
            repo.store(RankingSnapshot::new(id, query.clone(), Vec::new(), at))
                .await
                .unwrap();
        }

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["snap_b", "snap_c", "snap_a"]);

        assert!(repo.delete("snap_b").await.unwrap());
        assert!(!repo.delete("snap_b").await.unwrap());
        assert!(repo.get("snap_b").await.unwrap().is_none());
        assert_eq!(repo.get("snap_a").await.unwrap().unwrap().period, "1/2026");
    }
}
