//! Caller identification module
//!
//! Provides `ApprovedProfile`, `AdminAccess` and `TripViewer` extractors for
//! Axum handlers. Sign-in itself happens upstream; the gateway forwards the
//! signed-in profile id in `X-Profile-Id`. Administrator routes additionally
//! require `X-Admin-Token` to match the configured `ADMIN_TOKEN`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use waybill_core::{ProfileRecord, TripScope, UserStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the signed-in profile id
pub const PROFILE_HEADER: &str = "x-profile-id";

/// Header carrying the administrator token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::unauthorized(format!("Invalid {} header encoding", name))),
    }
}

/// Constant-time comparison over fixed-size digests, so neither the
/// contents nor the length of the expected token affect timing.
fn tokens_match(expected: &str, presented: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let presented = Sha256::digest(presented.as_bytes());
    expected.as_slice().ct_eq(presented.as_slice()).into()
}

fn is_admin(parts: &Parts, state: &AppState) -> Result<bool, ApiError> {
    let presented = header_value(parts, ADMIN_TOKEN_HEADER)?;
    Ok(match (state.admin_token.as_deref(), presented) {
        (Some(expected), Some(presented)) => tokens_match(expected, presented),
        _ => false,
    })
}

/// Approved community member making the request.
///
/// Returns 401 when the profile header is missing or names no known
/// profile, and 403 when the profile is not approved.
#[derive(Debug, Clone)]
pub struct ApprovedProfile(pub ProfileRecord);

impl FromRequestParts<AppState> for ApprovedProfile {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let profile_id = header_value(parts, PROFILE_HEADER)?
            .ok_or_else(|| ApiError::unauthorized("Missing X-Profile-Id header"))?;

        let profile = state
            .profiles
            .get(profile_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Unknown profile"))?;

        if profile.status != UserStatus::Approved {
            tracing::warn!(
                profile_id = %profile.id,
                status = ?profile.status,
                "Rejected request from unapproved profile"
            );
            return Err(ApiError::forbidden("Profile is not approved"));
        }

        Ok(Self(profile))
    }
}

/// Administrator access, granted by a matching `X-Admin-Token`.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.admin_token.is_none() {
            return Err(ApiError::forbidden("Administrator routes are disabled"));
        }
        if header_value(parts, ADMIN_TOKEN_HEADER)?.is_none() {
            return Err(ApiError::unauthorized("Missing X-Admin-Token header"));
        }
        if !is_admin(parts, state)? {
            return Err(ApiError::forbidden("Invalid administrator token"));
        }
        Ok(Self)
    }
}

/// Trips the caller may list.
///
/// Administrators see every trip; anyone else must be an approved profile
/// and sees the scope of their role.
#[derive(Debug, Clone)]
pub struct TripViewer {
    pub scope: TripScope,
}

impl FromRequestParts<AppState> for TripViewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if is_admin(parts, state)? {
            return Ok(Self {
                scope: TripScope::All,
            });
        }

        let ApprovedProfile(profile) = ApprovedProfile::from_request_parts(parts, state).await?;
        Ok(Self {
            scope: TripScope::for_viewer(&profile, false),
        })
    }
}
