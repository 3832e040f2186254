//! Ranking snapshot handlers
//!
//! Closing a month archives the current leaderboard. Anyone may read the
//! archive; creating and deleting snapshots requires administrator access.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use waybill_core::RankingSnapshot;

use super::ranking::{RankEntryResponse, RankingParams};
use crate::auth::AdminAccess;
use crate::error::ApiError;
use crate::state::AppState;

/// Filters of the leaderboard to archive
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SnapshotRequest {
    #[schema(example = "ENTREPRENEUR")]
    pub axis: Option<String>,
    #[schema(example = "WTDS")]
    pub platform: String,
    #[schema(example = "BOTH")]
    pub segment: Option<String>,
    pub search: Option<String>,
}

impl From<SnapshotRequest> for RankingParams {
    fn from(req: SnapshotRequest) -> Self {
        Self {
            axis: req.axis,
            platform: req.platform,
            segment: req.segment,
            search: req.search,
        }
    }
}

/// Snapshot listing entry
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotSummary {
    #[schema(example = "snap_0c9a5e2f4b6d4e8a9f1b3c5d7e9f1a2b")]
    pub id: String,
    /// Month the snapshot was taken in, `M/YYYY`
    #[schema(example = "3/2026")]
    pub period: String,
    pub axis: String,
    pub platform: String,
    pub segment: String,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&RankingSnapshot> for SnapshotSummary {
    fn from(s: &RankingSnapshot) -> Self {
        Self {
            id: s.id.clone(),
            period: s.period.clone(),
            axis: s.query.axis.to_string(),
            platform: s.query.platform.to_string(),
            segment: s.query.segment.to_string(),
            entry_count: s.entries.len(),
            created_at: s.created_at,
        }
    }
}

/// Archived leaderboard
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub summary: SnapshotSummary,
    pub search: String,
    pub entries: Vec<RankEntryResponse>,
}

impl From<RankingSnapshot> for SnapshotResponse {
    fn from(s: RankingSnapshot) -> Self {
        Self {
            summary: SnapshotSummary::from(&s),
            search: s.query.search,
            entries: RankEntryResponse::ranked(s.entries),
        }
    }
}

/// Archived snapshots, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotListResponse {
    pub snapshots: Vec<SnapshotSummary>,
}

/// Archive the current leaderboard
#[utoipa::path(
    post,
    path = "/ranking/snapshots",
    tag = "Ranking",
    params(("X-Admin-Token" = String, Header, description = "Administrator token")),
    request_body = SnapshotRequest,
    responses(
        (status = 201, description = "Snapshot stored", body = SnapshotResponse),
        (status = 400, description = "Unknown axis, platform or segment"),
        (status = 401, description = "Missing administrator token"),
        (status = 403, description = "Invalid administrator token")
    )
)]
pub async fn create_snapshot_handler(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Json(request): Json<SnapshotRequest>,
) -> Result<(StatusCode, Json<SnapshotResponse>), ApiError> {
    let query = RankingParams::from(request).to_query()?;
    let snapshot = state.ranking.take_snapshot(query, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

/// List archived snapshots
#[utoipa::path(
    get,
    path = "/ranking/snapshots",
    tag = "Ranking",
    responses((status = 200, description = "Snapshots, newest first", body = SnapshotListResponse))
)]
pub async fn list_snapshots_handler(
    State(state): State<AppState>,
) -> Result<Json<SnapshotListResponse>, ApiError> {
    let snapshots = state.ranking.list_snapshots().await?;
    Ok(Json(SnapshotListResponse {
        snapshots: snapshots.iter().map(SnapshotSummary::from).collect(),
    }))
}

/// Fetch one archived snapshot
#[utoipa::path(
    get,
    path = "/ranking/snapshots/{id}",
    tag = "Ranking",
    params(("id" = String, Path, description = "Snapshot id")),
    responses(
        (status = 200, description = "Snapshot", body = SnapshotResponse),
        (status = 404, description = "No such snapshot")
    )
)]
pub async fn get_snapshot_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let snapshot = state
        .ranking
        .get_snapshot(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Snapshot {}", id)))?;
    Ok(Json(snapshot.into()))
}

/// Delete an archived snapshot
#[utoipa::path(
    delete,
    path = "/ranking/snapshots/{id}",
    tag = "Ranking",
    params(
        ("id" = String, Path, description = "Snapshot id"),
        ("X-Admin-Token" = String, Header, description = "Administrator token")
    ),
    responses(
        (status = 204, description = "Snapshot deleted"),
        (status = 401, description = "Missing administrator token"),
        (status = 403, description = "Invalid administrator token"),
        (status = 404, description = "No such snapshot")
    )
)]
pub async fn delete_snapshot_handler(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.ranking.delete_snapshot(&id).await? {
        tracing::info!(snapshot_id = %id, "Ranking snapshot deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Snapshot {}", id)))
    }
}
