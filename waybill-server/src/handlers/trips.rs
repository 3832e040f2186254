//! Trip handlers
//!
//! Handles POST /trips (submission with two proof images) and GET /trips
//! (listing scoped to the caller).

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use waybill_core::{
    Amount, Platform, ProofUpload, Segment, Submitter, TripRecord, TripSubmission,
};

use crate::auth::{ApprovedProfile, TripViewer};
use crate::error::ApiError;
use crate::multipart::{FileField, MultipartFields};
use crate::state::AppState;
use crate::validation::parse_trip_date;

/// Multipart field holding the departure screenshot
pub const INITIAL_PROOF_FIELD: &str = "initial_proof";
/// Multipart field holding the arrival screenshot
pub const FINAL_PROOF_FIELD: &str = "final_proof";

/// A recorded trip
#[derive(Debug, Serialize, ToSchema)]
pub struct TripResponse {
    #[schema(example = "t_3f2b9c0e5a7d4c1b8e6f0a2d4c6e8a0b")]
    pub id: String,
    pub driver_id: String,
    pub driver_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[schema(example = "Curitiba")]
    pub origin: String,
    #[schema(example = "Santos")]
    pub destination: String,
    pub date: NaiveDate,
    /// Decimal value with two fraction digits
    #[schema(example = "1500.00")]
    pub value: String,
    #[schema(example = 150000_u64)]
    pub value_cents: u64,
    #[schema(example = "ETS2")]
    pub platform: String,
    #[schema(example = "TRUCK")]
    pub segment: String,
    /// SHA-256 of the departure screenshot (hex)
    pub initial_fingerprint: String,
    /// SHA-256 of the arrival screenshot (hex)
    pub final_fingerprint: String,
    pub initial_proof_ref: String,
    pub final_proof_ref: String,
    pub created_at: DateTime<Utc>,
}

impl From<TripRecord> for TripResponse {
    fn from(trip: TripRecord) -> Self {
        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            driver_name: trip.driver_name,
            company_name: trip.company_name,
            origin: trip.origin,
            destination: trip.destination,
            date: trip.date,
            value: trip.value_cents.to_string(),
            value_cents: trip.value_cents.cents(),
            platform: trip.platform.to_string(),
            segment: trip.segment.to_string(),
            initial_fingerprint: trip.initial_fingerprint.into(),
            final_fingerprint: trip.final_fingerprint.into(),
            initial_proof_ref: trip.initial_proof_ref,
            final_proof_ref: trip.final_proof_ref,
            created_at: trip.created_at,
        }
    }
}

/// Trips visible to the caller, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct TripListResponse {
    pub trips: Vec<TripResponse>,
    pub total: usize,
}

fn proof_upload(file: Option<FileField>) -> Option<ProofUpload> {
    file.map(|f| ProofUpload::new(f.data, f.file_name.unwrap_or_default()))
}

/// Record a completed trip
///
/// Accepts multipart/form-data with:
/// - **initial_proof** (required): departure screenshot
/// - **final_proof** (required): arrival screenshot
/// - **origin**, **destination** (required): free text
/// - **date** (required): `YYYY-MM-DD`
/// - **value** (required): amount, e.g. `1500`, `1500.00` or `1.500,00`
/// - **platform** (required): WTDS, WBDS, GTO, TOE3 or ETS2
/// - **segment** (optional): TRUCK (default), BUS or BOTH
///
/// Both screenshots are fingerprinted by content. A screenshot already used
/// on any earlier trip, in either slot and by any driver, is rejected.
#[utoipa::path(
    post,
    path = "/trips",
    tag = "Trips",
    params(("X-Profile-Id" = String, Header, description = "Signed-in profile id")),
    request_body(
        content_type = "multipart/form-data",
        description = "Trip fields and both proof screenshots"
    ),
    responses(
        (status = 201, description = "Trip recorded", body = TripResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "Caller not identified"),
        (status = 403, description = "Profile not approved"),
        (status = 409, description = "Proof image already used (DUPLICATE_PROOF)"),
        (status = 500, description = "Fingerprinting failed (FINGERPRINT_FAILED)"),
        (status = 504, description = "Fingerprinting timed out (FINGERPRINT_TIMEOUT)")
    )
)]
pub async fn submit_trip_handler(
    State(state): State<AppState>,
    ApprovedProfile(profile): ApprovedProfile,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<TripResponse>), ApiError> {
    let mut fields = MultipartFields::parse(
        &mut multipart,
        &[INITIAL_PROOF_FIELD, FINAL_PROOF_FIELD],
        state.max_file_size,
    )
    .await?;

    let submission = TripSubmission {
        origin: fields.get_text("origin").unwrap_or_default().to_string(),
        destination: fields.get_text("destination").unwrap_or_default().to_string(),
        date: parse_trip_date(fields.require_text("date")?)?,
        value: Amount::parse(fields.require_text("value")?)?,
        platform: fields.parse_text::<Platform>("platform")?,
        segment: match fields.get_text("segment").filter(|s| !s.trim().is_empty()) {
            Some(_) => fields.parse_text::<Segment>("segment")?,
            None => Segment::default(),
        },
        initial_proof: proof_upload(fields.take_file(INITIAL_PROOF_FIELD)),
        final_proof: proof_upload(fields.take_file(FINAL_PROOF_FIELD)),
    };

    let trip = state
        .trips
        .submit_trip(&Submitter::from(&profile), submission)
        .await?;

    Ok((StatusCode::CREATED, Json(trip.into())))
}

/// List trips visible to the caller
///
/// Administrators (valid `X-Admin-Token`) see every trip. Company owners and
/// groupings see their company's trips; everyone else sees their own.
#[utoipa::path(
    get,
    path = "/trips",
    tag = "Trips",
    params(
        ("X-Profile-Id" = Option<String>, Header, description = "Signed-in profile id"),
        ("X-Admin-Token" = Option<String>, Header, description = "Administrator token")
    ),
    responses(
        (status = 200, description = "Visible trips, newest first", body = TripListResponse),
        (status = 401, description = "Caller not identified"),
        (status = 403, description = "Profile not approved")
    )
)]
pub async fn list_trips_handler(
    State(state): State<AppState>,
    viewer: TripViewer,
) -> Result<Json<TripListResponse>, ApiError> {
    let trips: Vec<TripResponse> = state
        .trips
        .list_visible(&viewer.scope)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(TripListResponse {
        total: trips.len(),
        trips,
    }))
}
