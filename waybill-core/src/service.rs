//! Trip submission and leaderboard services.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::detector;
use crate::error::{Result, WaybillError};
use crate::fingerprint::Fingerprinter;
use crate::model::{Amount, Platform, ProfileRecord, Segment, TripRecord};
use crate::ranking::{compute_ranking, RankEntry, RankingQuery};
use crate::snapshot::RankingSnapshot;
use crate::store::{ProfileRepository, SnapshotRepository, SubmissionLock, TripRepository};
use crate::visibility::{visible_trips, TripScope};

/// Stages a submission moves through. See [`SubmissionState::is_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    CollectingInput,
    ComputingFingerprints,
    CheckingDuplicates,
    Persisting,
    Succeeded,
    RejectedDuplicate,
    RejectedValidation,
    FailedTimeout,
    FailedIo,
}

impl SubmissionState {
    /// Terminal state reached when a submission fails with `err`.
    pub fn for_error(err: &WaybillError) -> Self {
        match err {
            WaybillError::DuplicateProof { .. } => Self::RejectedDuplicate,
            WaybillError::Validation(_) | WaybillError::InvalidFingerprint(_) => {
                Self::RejectedValidation
            }
            WaybillError::Timeout { .. } => Self::FailedTimeout,
            _ => Self::FailedIo,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded
                | Self::RejectedDuplicate
                | Self::RejectedValidation
                | Self::FailedTimeout
                | Self::FailedIo
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CollectingInput => "COLLECTING_INPUT",
            Self::ComputingFingerprints => "COMPUTING_FINGERPRINTS",
            Self::CheckingDuplicates => "CHECKING_DUPLICATES",
            Self::Persisting => "PERSISTING",
            Self::Succeeded => "SUCCEEDED",
            Self::RejectedDuplicate => "REJECTED_DUPLICATE",
            Self::RejectedValidation => "REJECTED_VALIDATION",
            Self::FailedTimeout => "FAILED_TIMEOUT",
            Self::FailedIo => "FAILED_IO",
        };
        f.write_str(s)
    }
}

/// Raw bytes of one uploaded proof image.
#[derive(Clone)]
pub struct ProofUpload {
    pub bytes: Vec<u8>,
    /// Opaque reference kept for display (file name or storage URL)
    pub display_ref: String,
}

impl ProofUpload {
    pub fn new(bytes: Vec<u8>, display_ref: impl Into<String>) -> Self {
        Self {
            bytes,
            display_ref: display_ref.into(),
        }
    }
}

impl fmt::Debug for ProofUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofUpload")
            .field("bytes", &self.bytes.len())
            .field("display_ref", &self.display_ref)
            .finish()
    }
}

/// Fields of a trip as entered by the driver.
#[derive(Debug, Clone)]
pub struct TripSubmission {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub value: Amount,
    pub platform: Platform,
    pub segment: Segment,
    pub initial_proof: Option<ProofUpload>,
    pub final_proof: Option<ProofUpload>,
}

impl TripSubmission {
    /// Check required fields and hand back both proofs.
    fn validate(self) -> Result<(ValidTrip, ProofUpload, ProofUpload)> {
        let origin = self.origin.trim().to_string();
        let destination = self.destination.trim().to_string();
        if origin.is_empty() {
            return Err(WaybillError::validation("Origin is required"));
        }
        if destination.is_empty() {
            return Err(WaybillError::validation("Destination is required"));
        }

        let initial = self
            .initial_proof
            .filter(|p| !p.bytes.is_empty())
            .ok_or_else(|| WaybillError::validation("Initial proof image is required"))?;
        let final_ = self
            .final_proof
            .filter(|p| !p.bytes.is_empty())
            .ok_or_else(|| WaybillError::validation("Final proof image is required"))?;

        let trip = ValidTrip {
            origin,
            destination,
            date: self.date,
            value: self.value,
            platform: self.platform,
            segment: self.segment,
        };
        Ok((trip, initial, final_))
    }
}

struct ValidTrip {
    origin: String,
    destination: String,
    date: NaiveDate,
    value: Amount,
    platform: Platform,
    segment: Segment,
}

/// Authenticated driver on whose behalf a trip is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub driver_id: String,
    pub driver_name: String,
    pub company_name: Option<String>,
}

impl From<&ProfileRecord> for Submitter {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            driver_id: profile.id.clone(),
            driver_name: profile.name.clone(),
            company_name: profile.company().map(str::to_string),
        }
    }
}

/// Records trips after the proof images pass the duplicate check.
#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn TripRepository>,
    lock: Arc<dyn SubmissionLock>,
    fingerprinter: Fingerprinter,
}

impl TripService {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        lock: Arc<dyn SubmissionLock>,
        fingerprinter: Fingerprinter,
    ) -> Self {
        Self {
            trips,
            lock,
            fingerprinter,
        }
    }

    /// Validate, fingerprint, check and persist one trip.
    ///
    /// The history read, the duplicate check and the append all happen
    /// while the submission lock is held, so two concurrent submissions
    /// sharing a proof can never both succeed. Nothing is persisted unless
    /// the whole sequence succeeds.
    pub async fn submit_trip(
        &self,
        submitter: &Submitter,
        submission: TripSubmission,
    ) -> Result<TripRecord> {
        let span = info_span!("submit_trip", driver_id = %submitter.driver_id);

        async move {
            match self.run_submission(submitter, submission).await {
                Ok(trip) => {
                    info!(
                        trip_id = %trip.id,
                        state = %SubmissionState::Succeeded,
                        "Trip recorded"
                    );
                    Ok(trip)
                }
                Err(e) => {
                    warn!(state = %SubmissionState::for_error(&e), error = %e, "Trip submission failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_submission(
        &self,
        submitter: &Submitter,
        submission: TripSubmission,
    ) -> Result<TripRecord> {
        debug!(state = %SubmissionState::CollectingInput);
        if submitter.driver_id.trim().is_empty() {
            return Err(WaybillError::validation("Submitter is not identified"));
        }
        let (trip, initial, final_) = submission.validate()?;

        debug!(state = %SubmissionState::ComputingFingerprints);
        let (initial_fp, final_fp) = self
            .fingerprinter
            .fingerprint_pair(initial.bytes, final_.bytes)
            .await?;

        debug!(state = %SubmissionState::CheckingDuplicates);
        let _guard = self.lock.acquire().await?;
        let history = self.trips.list_all().await?;
        detector::ensure_unique(&initial_fp, &final_fp, &history)?;

        debug!(state = %SubmissionState::Persisting, history = history.len());
        let record = TripRecord {
            id: new_trip_id(),
            driver_id: submitter.driver_id.clone(),
            driver_name: submitter.driver_name.clone(),
            company_name: submitter.company_name.clone(),
            origin: trip.origin,
            destination: trip.destination,
            date: trip.date,
            value_cents: trip.value,
            platform: trip.platform,
            segment: trip.segment,
            initial_fingerprint: initial_fp,
            final_fingerprint: final_fp,
            initial_proof_ref: initial.display_ref,
            final_proof_ref: final_.display_ref,
            created_at: Utc::now(),
        };
        self.trips.append(record.clone()).await?;

        Ok(record)
    }

    /// Trips visible under `scope`, newest first.
    pub async fn list_visible(&self, scope: &TripScope) -> Result<Vec<TripRecord>> {
        Ok(visible_trips(self.trips.list_all().await?, scope))
    }
}

fn new_trip_id() -> String {
    format!("t_{}", Uuid::new_v4().simple())
}

/// Serves leaderboards and their snapshots.
#[derive(Clone)]
pub struct RankingService {
    trips: Arc<dyn TripRepository>,
    profiles: Arc<dyn ProfileRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl RankingService {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        profiles: Arc<dyn ProfileRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        Self {
            trips,
            profiles,
            snapshots,
        }
    }

    /// Current leaderboard, recomputed from the full collections.
    pub async fn get_ranking(&self, query: &RankingQuery) -> Result<Vec<RankEntry>> {
        let (profiles, trips) =
            tokio::try_join!(self.profiles.list_all(), self.trips.list_all())?;
        Ok(compute_ranking(&profiles, &trips, query))
    }

    /// Freeze the current leaderboard for `query`.
    pub async fn take_snapshot(
        &self,
        query: RankingQuery,
        now: DateTime<Utc>,
    ) -> Result<RankingSnapshot> {
        let entries = self.get_ranking(&query).await?;
        let snapshot = RankingSnapshot::new(
            format!("snap_{}", Uuid::new_v4().simple()),
            query,
            entries,
            now,
        );
        self.snapshots.store(snapshot.clone()).await?;

        info!(
            snapshot_id = %snapshot.id,
            period = %snapshot.period,
            entries = snapshot.entries.len(),
            "Ranking snapshot stored"
        );
        Ok(snapshot)
    }

    pub async fn list_snapshots(&self) -> Result<Vec<RankingSnapshot>> {
        self.snapshots.list().await
    }

    pub async fn get_snapshot(&self, id: &str) -> Result<Option<RankingSnapshot>> {
        self.snapshots.get(id).await
    }

    pub async fn delete_snapshot(&self, id: &str) -> Result<bool> {
        self.snapshots.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::model::{UserCategory, UserStatus};
    use crate::ranking::RankAxis;
    use crate::store::{
        LocalSubmissionLock, MemoryProfileRepository, MemorySnapshotRepository,
        MemoryTripRepository, SubmissionGuard,
    };

    fn submitter(id: &str) -> Submitter {
        Submitter {
            driver_id: id.to_string(),
            driver_name: id.to_uppercase(),
            company_name: None,
        }
    }

    fn submission(initial: &[u8], final_: &[u8], cents: u64) -> TripSubmission {
        TripSubmission {
            origin: "  Sao Paulo ".to_string(),
            destination: "Rio de Janeiro".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 4, 12).unwrap(),
            value: Amount::from_cents(cents),
            platform: Platform::Ets2,
            segment: Segment::Truck,
            initial_proof: Some(ProofUpload::new(initial.to_vec(), "inicio.png")),
            final_proof: Some(ProofUpload::new(final_.to_vec(), "fim.png")),
        }
    }

    fn service(repo: Arc<MemoryTripRepository>) -> TripService {
        TripService::new(repo, Arc::new(LocalSubmissionLock::new()), Fingerprinter::new())
    }

    #[tokio::test]
    async fn test_first_submission_is_recorded() {
        let repo = Arc::new(MemoryTripRepository::new());
        let trip = service(repo.clone())
            .submit_trip(&submitter("ana"), submission(b"img-A", b"img-B", 150_000))
            .await
            .unwrap();

        assert!(trip.id.starts_with("t_"));
        assert_eq!(trip.origin, "Sao Paulo");
        assert_eq!(trip.driver_name, "ANA");
        assert_eq!(trip.initial_fingerprint, crate::Fingerprint::of(b"img-A"));
        assert_eq!(trip.final_proof_ref, "fim.png");
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_reused_proof_is_rejected_for_any_driver() {
        let repo = Arc::new(MemoryTripRepository::new());
        let svc = service(repo.clone());
        let first = svc
            .submit_trip(&submitter("ana"), submission(b"img-A", b"img-B", 100))
            .await
            .unwrap();

        // initial image of trip one reused as final image by another driver
        let err = svc
            .submit_trip(&submitter("bia"), submission(b"img-C", b"img-A", 100))
            .await
            .unwrap_err();
        match &err {
            WaybillError::DuplicateProof { trip_id, .. } => assert_eq!(trip_id, &first.id),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(SubmissionState::for_error(&err), SubmissionState::RejectedDuplicate);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_proof_fails_validation() {
        let repo = Arc::new(MemoryTripRepository::new());
        let mut input = submission(b"img-A", b"img-B", 100);
        input.final_proof = None;

        let err = service(repo.clone())
            .submit_trip(&submitter("ana"), input)
            .await
            .unwrap_err();
        assert_eq!(SubmissionState::for_error(&err), SubmissionState::RejectedValidation);

        let mut empty = submission(b"img-A", b"", 100);
        empty.origin = "x".to_string();
        assert!(service(repo.clone())
            .submit_trip(&submitter("ana"), empty)
            .await
            .is_err());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_blank_fields_fail_validation() {
        let repo = Arc::new(MemoryTripRepository::new());
        let mut input = submission(b"img-A", b"img-B", 100);
        input.destination = "   ".to_string();
        let err = service(repo.clone())
            .submit_trip(&submitter("ana"), input)
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Validation(_)));

        let err = service(repo)
            .submit_trip(&submitter(""), submission(b"img-A", b"img-B", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_submissions_sharing_a_proof() {
        let repo = Arc::new(MemoryTripRepository::new());
        let svc = service(repo.clone());

        let mut handles = Vec::new();
        for n in 0..8u8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                let unique = [b'u', n];
                svc.submit_trip(&submitter("racer"), submission(b"shared", &unique, 100))
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert!(matches!(e, WaybillError::DuplicateProof { .. })),
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(repo.len().await, 1);
    }

    struct FailingStore;

    #[async_trait]
    impl TripRepository for FailingStore {
        async fn list_all(&self) -> Result<Vec<TripRecord>> {
            Ok(Vec::new())
        }

        async fn append(&self, _trip: TripRecord) -> Result<()> {
            Err(WaybillError::storage("disk full"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_error() {
        let svc = TripService::new(
            Arc::new(FailingStore),
            Arc::new(LocalSubmissionLock::new()),
            Fingerprinter::new(),
        );
        let err = svc
            .submit_trip(&submitter("ana"), submission(b"a", b"b", 1))
            .await
            .unwrap_err();
        assert_eq!(SubmissionState::for_error(&err), SubmissionState::FailedIo);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fingerprint_timeout_leaves_store_untouched() {
        let repo = Arc::new(MemoryTripRepository::new());
        let svc = TripService::new(
            repo.clone(),
            Arc::new(LocalSubmissionLock::new()),
            Fingerprinter::with_timeout(Duration::ZERO),
        );
        let large = vec![0x5Au8; 16 * 1024 * 1024];

        let err = svc
            .submit_trip(&submitter("ana"), submission(&large, b"img-B", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Timeout { millis: 0 }));
        assert_eq!(SubmissionState::for_error(&err), SubmissionState::FailedTimeout);
        assert!(repo.is_empty().await);
    }

    #[test]
    fn test_computation_failure_is_io_state() {
        let err = WaybillError::Computation("Fingerprint task failed".to_string());
        assert_eq!(SubmissionState::for_error(&err), SubmissionState::FailedIo);
    }

    struct StuckLock;

    #[async_trait]
    impl SubmissionLock for StuckLock {
        async fn acquire(&self) -> Result<SubmissionGuard> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_fingerprints_are_computed_before_the_lock() {
        // A submission with a missing proof never reaches the stuck lock.
        let svc = TripService::new(
            Arc::new(MemoryTripRepository::new()),
            Arc::new(StuckLock),
            Fingerprinter::with_timeout(Duration::from_secs(1)),
        );
        let mut input = submission(b"a", b"b", 1);
        input.initial_proof = None;
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            svc.submit_trip(&submitter("ana"), input),
        )
        .await
        .expect("validation must not wait on the lock");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_visible_scopes() {
        let repo = Arc::new(MemoryTripRepository::new());
        let svc = service(repo);
        svc.submit_trip(&submitter("ana"), submission(b"1", b"2", 10))
            .await
            .unwrap();
        svc.submit_trip(&submitter("bia"), submission(b"3", b"4", 20))
            .await
            .unwrap();

        let own = svc
            .list_visible(&TripScope::Driver("bia".to_string()))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].driver_id, "bia");
        assert_eq!(svc.list_visible(&TripScope::All).await.unwrap().len(), 2);
    }

    fn approved(id: &str, name: &str) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            name: name.to_string(),
            status: UserStatus::Approved,
            category: UserCategory::Driver,
            company_name: None,
            platforms: vec![Platform::Ets2],
            segment: Segment::Truck,
            photo_url: String::new(),
            logo_url: None,
            flag_url: None,
        }
    }

    #[tokio::test]
    async fn test_ranking_and_snapshots() {
        let trips = Arc::new(MemoryTripRepository::new());
        let profiles = Arc::new(MemoryProfileRepository::new(vec![
            approved("ana", "Ana"),
            approved("bia", "Bia"),
        ]));
        let trip_svc = service(trips.clone());
        trip_svc
            .submit_trip(&submitter("bia"), submission(b"x1", b"x2", 70_000))
            .await
            .unwrap();

        let ranking = RankingService::new(
            trips,
            profiles,
            Arc::new(MemorySnapshotRepository::new()),
        );
        let query = RankingQuery::new(RankAxis::Driver, Platform::Ets2, Segment::Both);
        let entries = ranking.get_ranking(&query).await.unwrap();
        assert_eq!(entries[0].entity_id, "bia");
        assert_eq!(entries.len(), 2);

        let now = Utc.with_ymd_and_hms(2026, 9, 30, 18, 0, 0).unwrap();
        let snapshot = ranking.take_snapshot(query, now).await.unwrap();
        assert!(snapshot.id.starts_with("snap_"));
        assert_eq!(snapshot.period, "9/2026");
        assert_eq!(snapshot.entries, entries);

        assert_eq!(ranking.list_snapshots().await.unwrap().len(), 1);
        assert!(ranking.delete_snapshot(&snapshot.id).await.unwrap());
        assert!(ranking.get_snapshot(&snapshot.id).await.unwrap().is_none());
    }
}
