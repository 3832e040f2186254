//! Waybill Core - proof-of-delivery integrity for simulator trucking communities
//!
//! Drivers log completed trips together with two screenshots: one taken at
//! departure and one at arrival. This crate keeps those proofs honest and
//! turns the accepted trips into leaderboards.
//!
//! # Features
//!
//! - SHA-256 content fingerprints of proof images
//! - Global duplicate detection: a proof image is usable exactly once
//! - Serialized check-then-append trip submission
//! - Leaderboards per driver, company, grouping or autonomous operator
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use waybill_core::{
//!     Amount, Fingerprinter, LocalSubmissionLock, MemoryTripRepository, Platform, ProofUpload,
//!     Segment, Submitter, TripService, TripSubmission,
//! };
//!
//! # async fn example() -> waybill_core::Result<()> {
//! let service = TripService::new(
//!     Arc::new(MemoryTripRepository::new()),
//!     Arc::new(LocalSubmissionLock::new()),
//!     Fingerprinter::new(),
//! );
//!
//! let driver = Submitter {
//!     driver_id: "u_42".into(),
//!     driver_name: "Ana".into(),
//!     company_name: None,
//! };
//! let trip = service
//!     .submit_trip(
//!         &driver,
//!         TripSubmission {
//!             origin: "Curitiba".into(),
//!             destination: "Santos".into(),
//!             date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
//!             value: Amount::parse("1.500,00")?,
//!             platform: Platform::Ets2,
//!             segment: Segment::Truck,
//!             initial_proof: Some(ProofUpload::new(std::fs::read("start.png").unwrap(), "start.png")),
//!             final_proof: Some(ProofUpload::new(std::fs::read("end.png").unwrap(), "end.png")),
//!         },
//!     )
//!     .await?;
//! println!("recorded {}", trip.id);
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod ranking;
pub mod snapshot;
pub mod visibility;

#[cfg(feature = "runtime")]
pub mod service;
#[cfg(feature = "runtime")]
pub mod store;

pub use detector::{ensure_unique, find_duplicate, DuplicateMatch, ProofIndex, ProofRole};
pub use envelope::{decode_trips, TripEnvelope};
pub use error::{Result, WaybillError, CURRENT_SCHEMA_VERSION, FINGERPRINT_HEX_LEN};
pub use fingerprint::Fingerprint;
pub use model::{
    Amount, Platform, ProfileRecord, Segment, TripRecord, UserCategory, UserStatus,
};
pub use ranking::{compute_ranking, RankAxis, RankEntry, RankingQuery};
pub use snapshot::RankingSnapshot;
pub use visibility::{visible_trips, TripScope};

// Async services and stores (not available in Wasm)
#[cfg(feature = "runtime")]
pub use fingerprint::{bounded, compute_fingerprint, Fingerprinter};
#[cfg(feature = "runtime")]
pub use service::{
    ProofUpload, RankingService, SubmissionState, Submitter, TripService, TripSubmission,
};
#[cfg(feature = "runtime")]
pub use store::{
    FileSubmissionLock, JsonFileProfileRepository, JsonFileTripRepository, LocalSubmissionLock,
    MemoryProfileRepository, MemorySnapshotRepository, MemoryTripRepository, ProfileRepository,
    SnapshotRepository, SubmissionGuard, SubmissionLock, TripRepository,
};
