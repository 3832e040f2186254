//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod ranking;
pub mod snapshots;
pub mod trips;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use ranking::{ranking_handler, RankEntryResponse, RankingParams, RankingResponse};
pub use snapshots::{
    create_snapshot_handler, delete_snapshot_handler, get_snapshot_handler,
    list_snapshots_handler, SnapshotListResponse, SnapshotRequest, SnapshotResponse,
    SnapshotSummary,
};
pub use trips::{list_trips_handler, submit_trip_handler, TripListResponse, TripResponse};
