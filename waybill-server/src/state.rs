//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use waybill_core::{
    Fingerprinter, LocalSubmissionLock, MemoryProfileRepository, MemorySnapshotRepository,
    MemoryTripRepository, ProfileRecord, ProfileRepository, RankingService, SnapshotRepository,
    SubmissionLock, TripRepository, TripService,
};

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Trip submission and listing
    pub trips: TripService,
    /// Leaderboards and snapshots
    pub ranking: RankingService,
    /// Profile lookup for caller identification
    pub profiles: Arc<dyn ProfileRepository>,
    /// Shared secret for administrator routes
    pub admin_token: Option<String>,
    /// Maximum size of one proof image in bytes
    pub max_file_size: usize,
    /// Name of the trip store backend, reported by readiness checks
    pub store_backend: &'static str,
}

impl AppState {
    /// `submission_lock` must be shared with every other writer of
    /// `trip_store`; file-backed stores pass their file lock.
    pub fn new(
        config: &Config,
        trip_store: Arc<dyn TripRepository>,
        submission_lock: Arc<dyn SubmissionLock>,
        profiles: Arc<dyn ProfileRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        store_backend: &'static str,
    ) -> Self {
        let fingerprinter = match config.fingerprint_timeout() {
            Some(limit) => Fingerprinter::with_timeout(limit),
            None => Fingerprinter::new(),
        };

        Self {
            trips: TripService::new(trip_store.clone(), submission_lock, fingerprinter),
            ranking: RankingService::new(trip_store, profiles.clone(), snapshots),
            profiles,
            admin_token: config.admin_token.clone(),
            max_file_size: config.max_file_size(),
            store_backend,
        }
    }

    /// State backed entirely by memory, seeded with `profiles`.
    pub fn in_memory(config: &Config, profiles: Vec<ProfileRecord>) -> Self {
        Self::new(
            config,
            Arc::new(MemoryTripRepository::new()),
            Arc::new(LocalSubmissionLock::new()),
            Arc::new(MemoryProfileRepository::new(profiles)),
            Arc::new(MemorySnapshotRepository::new()),
            "memory",
        )
    }
}
