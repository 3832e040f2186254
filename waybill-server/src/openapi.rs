//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, RankEntryResponse, RankingResponse, ReadyResponse, SnapshotListResponse,
    SnapshotRequest, SnapshotResponse, SnapshotSummary, TripListResponse, TripResponse,
};

/// Waybill API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waybill API",
        description = r#"
## Trip records and leaderboards for a trucking simulator community

Drivers record completed trips in WTDS, WBDS, GTO, TOE3 and ETS2, proving
each trip with two screenshots: one at departure and one at arrival.

### How It Works

1. **Submit** a trip via `POST /trips` with both screenshots
2. Each screenshot is fingerprinted (SHA-256 of its bytes)
3. A screenshot already used on any earlier trip, in either slot and by
   any driver, is rejected with `409 DUPLICATE_PROOF`
4. **Rank** drivers, companies, groupings and autonomous drivers via `GET /ranking`
5. Administrators archive monthly leaderboards via `POST /ranking/snapshots`

### Caller identification

Requests carry the signed-in profile id in `X-Profile-Id`. Administrator
routes require `X-Admin-Token`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Trips", description = "Submit and list trips"),
        (name = "Ranking", description = "Leaderboards and monthly snapshots"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::trips::submit_trip_handler,
        crate::handlers::trips::list_trips_handler,
        crate::handlers::ranking::ranking_handler,
        crate::handlers::snapshots::create_snapshot_handler,
        crate::handlers::snapshots::list_snapshots_handler,
        crate::handlers::snapshots::get_snapshot_handler,
        crate::handlers::snapshots::delete_snapshot_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            TripResponse,
            TripListResponse,
            RankEntryResponse,
            RankingResponse,
            SnapshotRequest,
            SnapshotSummary,
            SnapshotResponse,
            SnapshotListResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/ready",
            "/trips",
            "/ranking",
            "/ranking/snapshots",
            "/ranking/snapshots/{id}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
