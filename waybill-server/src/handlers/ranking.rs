//! Leaderboard handler
//!
//! Handles GET /ranking. Leaderboards are recomputed from the full trip and
//! profile collections on every request.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use waybill_core::{Platform, RankAxis, RankEntry, RankingQuery, Segment};

use crate::error::ApiError;
use crate::state::AppState;

/// Leaderboard filters
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RankingParams {
    /// DRIVER (default), ENTREPRENEUR, GROUPING or AUTONOMOUS
    #[param(example = "DRIVER")]
    pub axis: Option<String>,
    /// WTDS, WBDS, GTO, TOE3 or ETS2
    #[param(example = "ETS2")]
    pub platform: String,
    /// TRUCK, BUS or BOTH (default, matches every segment)
    #[param(example = "BOTH")]
    pub segment: Option<String>,
    /// Case-insensitive match on name or company name
    pub search: Option<String>,
}

impl RankingParams {
    pub fn to_query(&self) -> Result<RankingQuery, ApiError> {
        let axis = match self.axis.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(axis) => axis.parse::<RankAxis>()?,
            None => RankAxis::Driver,
        };
        let segment = match self.segment.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(segment) => segment.parse::<Segment>()?,
            None => Segment::Both,
        };
        let platform = self.platform.parse::<Platform>()?;

        Ok(RankingQuery::new(axis, platform, segment)
            .with_search(self.search.clone().unwrap_or_default()))
    }
}

/// One leaderboard row
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankEntryResponse {
    /// 1-based position
    #[schema(example = 1)]
    pub position: usize,
    pub entity_id: String,
    /// Company name on the ENTREPRENEUR axis, profile name otherwise
    pub display_name: String,
    pub profile_name: String,
    #[schema(example = "DRIVER")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[schema(example = "3000.00")]
    pub total_value: String,
    #[schema(example = 300000_u64)]
    pub total_value_cents: u64,
    #[schema(example = 2_u64)]
    pub trip_count: u64,
}

impl RankEntryResponse {
    pub fn ranked(entries: Vec<RankEntry>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| Self {
                position: i + 1,
                entity_id: e.entity_id,
                display_name: e.display_name,
                profile_name: e.profile_name,
                category: e.category.to_string(),
                company_name: e.company_name,
                image_ref: e.image_ref,
                total_value: e.total_value_cents.to_string(),
                total_value_cents: e.total_value_cents.cents(),
                trip_count: e.trip_count,
            })
            .collect()
    }
}

/// Leaderboard with the filters that produced it
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingResponse {
    pub axis: String,
    pub platform: String,
    pub segment: String,
    pub search: String,
    pub entries: Vec<RankEntryResponse>,
}

/// Compute a leaderboard
///
/// Ordered by total trip value, then trip count, both descending. Only
/// approved profiles appear.
#[utoipa::path(
    get,
    path = "/ranking",
    tag = "Ranking",
    params(RankingParams),
    responses(
        (status = 200, description = "Leaderboard", body = RankingResponse),
        (status = 400, description = "Unknown axis, platform or segment")
    )
)]
pub async fn ranking_handler(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<RankingResponse>, ApiError> {
    let query = params.to_query()?;
    let entries = state.ranking.get_ranking(&query).await?;

    Ok(Json(RankingResponse {
        axis: query.axis.to_string(),
        platform: query.platform.to_string(),
        segment: query.segment.to_string(),
        search: query.search,
        entries: RankEntryResponse::ranked(entries),
    }))
}
