//! WebAssembly bindings for Waybill.
//!
//! Lets a browser front end that keeps its own trip history fingerprint
//! proof images, check them for reuse and compute leaderboards without a
//! server round trip. Collections are exchanged as JSON strings.

use serde::Serialize;
use wasm_bindgen::prelude::*;
use waybill_core::{
    compute_ranking, decode_trips, find_duplicate, Fingerprint, ProfileRecord, RankAxis,
    RankEntry, RankingQuery, WaybillError,
};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Outcome of a duplicate check.
#[derive(Debug, Default, Serialize)]
pub struct DuplicateVerdict {
    /// Whether either candidate was already used
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// `initial` or `final`: slot of the colliding candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_trip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_role: Option<String>,
    /// Set when the inputs could not be checked; `duplicate` is then false
    /// and the submission must not proceed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Leaderboard result.
#[derive(Debug, Default, Serialize)]
pub struct RankingResult {
    pub entries: Vec<RankEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error":"Serialization error: {}"}}"#, e))
}

/// SHA-256 fingerprint of a proof image, as 64 lowercase hex characters.
#[wasm_bindgen]
pub fn fingerprint(bytes: &[u8]) -> String {
    Fingerprint::of(bytes).to_string()
}

/// Check two candidate fingerprints against a trip history.
///
/// `trips_json` is either a bare array of trips or a versioned
/// `{ "schema_version": 1, "trips": [...] }` envelope.
///
/// # Returns
/// A JSON-encoded [`DuplicateVerdict`]
#[wasm_bindgen]
pub fn check_duplicate(initial: &str, final_: &str, trips_json: &str) -> String {
    let verdict = match check_duplicate_internal(initial, final_, trips_json) {
        Ok(verdict) => verdict,
        Err(e) => DuplicateVerdict {
            error: Some(e.to_string()),
            ..DuplicateVerdict::default()
        },
    };
    to_json(&verdict)
}

fn check_duplicate_internal(
    initial: &str,
    final_: &str,
    trips_json: &str,
) -> Result<DuplicateVerdict, WaybillError> {
    let history = decode_trips(trips_json.as_bytes())?;

    Ok(match find_duplicate(initial, final_, &history)? {
        Some(found) => DuplicateVerdict {
            duplicate: true,
            fingerprint: Some(found.fingerprint.to_string()),
            candidate_role: Some(found.candidate_role.to_string()),
            existing_trip_id: Some(found.existing_trip_id),
            existing_role: Some(found.existing_role.to_string()),
            error: None,
        },
        None => DuplicateVerdict::default(),
    })
}

/// Compute a leaderboard from JSON collections.
///
/// `axis`, `platform` and `segment` take the same codes as the server
/// (`DRIVER`, `ETS2`, `BOTH`, ...); an empty `search` matches everything.
///
/// # Returns
/// A JSON-encoded [`RankingResult`]
#[wasm_bindgen]
pub fn rank(
    profiles_json: &str,
    trips_json: &str,
    axis: &str,
    platform: &str,
    segment: &str,
    search: &str,
) -> String {
    let result = match rank_internal(profiles_json, trips_json, axis, platform, segment, search) {
        Ok(entries) => RankingResult {
            entries,
            error: None,
        },
        Err(e) => RankingResult {
            entries: Vec::new(),
            error: Some(e.to_string()),
        },
    };
    to_json(&result)
}

fn rank_internal(
    profiles_json: &str,
    trips_json: &str,
    axis: &str,
    platform: &str,
    segment: &str,
    search: &str,
) -> Result<Vec<RankEntry>, WaybillError> {
    let profiles: Vec<ProfileRecord> = serde_json::from_str(profiles_json)?;
    let trips = decode_trips(trips_json.as_bytes())?;
    let query = RankingQuery::new(axis.parse::<RankAxis>()?, platform.parse()?, segment.parse()?)
        .with_search(search);

    Ok(compute_ranking(&profiles, &trips, &query))
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
