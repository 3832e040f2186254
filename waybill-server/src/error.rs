//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use waybill_core::WaybillError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - caller could not be identified
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden - caller is known but may not perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the trip integrity core
    #[error("Waybill error: {0}")]
    Waybill(#[from] WaybillError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Waybill(ref e) => match e {
                // Client-provided invalid input → 400
                WaybillError::Validation(_) | WaybillError::InvalidFingerprint(_) => {
                    StatusCode::BAD_REQUEST
                }

                // Reused proof or a lost race on the store → 409
                WaybillError::DuplicateProof { .. } | WaybillError::ConcurrencyConflict(_) => {
                    StatusCode::CONFLICT
                }

                WaybillError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,

                // Internal processing failures → 500
                WaybillError::Computation(_)
                | WaybillError::Storage(_)
                | WaybillError::Serialization(_)
                | WaybillError::UnsupportedSchemaVersion(_, _) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Waybill(ref e) => match e {
                WaybillError::Validation(_) => "VALIDATION_ERROR",
                WaybillError::DuplicateProof { .. } => "DUPLICATE_PROOF",
                WaybillError::InvalidFingerprint(_) => "INVALID_FINGERPRINT",
                WaybillError::Computation(_) => "FINGERPRINT_FAILED",
                WaybillError::Timeout { .. } => "FINGERPRINT_TIMEOUT",
                WaybillError::ConcurrencyConflict(_) => "CONCURRENT_SUBMISSION",
                WaybillError::Storage(_) => "STORAGE_ERROR",
                WaybillError::Serialization(_) => "SERIALIZATION_ERROR",
                WaybillError::UnsupportedSchemaVersion(_, _) => "UNSUPPORTED_SCHEMA_VERSION",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Waybill(ref e) => match e {
                WaybillError::Validation(message) => message.clone(),
                WaybillError::DuplicateProof { .. } => {
                    "This proof image was already used on another trip".to_string()
                }
                WaybillError::InvalidFingerprint(_) => "Invalid proof fingerprint".to_string(),
                WaybillError::Computation(_) => {
                    "Could not fingerprint the proof images, please try again".to_string()
                }
                WaybillError::Timeout { .. } => {
                    "Fingerprinting the proof images took too long, please try again".to_string()
                }
                WaybillError::ConcurrencyConflict(_) => {
                    "Another submission changed the trip log, please try again".to_string()
                }
                WaybillError::Storage(_)
                | WaybillError::Serialization(_)
                | WaybillError::UnsupportedSchemaVersion(_, _) => {
                    "Trip storage is unavailable".to_string()
                }
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::Waybill(_) => "waybill",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waybill_error_statuses() {
        let cases = [
            (WaybillError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                WaybillError::DuplicateProof {
                    fingerprint: "ab".into(),
                    trip_id: "t_1".into(),
                },
                StatusCode::CONFLICT,
                "DUPLICATE_PROOF",
            ),
            (
                WaybillError::Computation("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "FINGERPRINT_FAILED",
            ),
            (
                WaybillError::Timeout { millis: 10 },
                StatusCode::GATEWAY_TIMEOUT,
                "FINGERPRINT_TIMEOUT",
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let api = ApiError::from(WaybillError::storage("/var/lib/waybill/trips.json: EACCES"));
        assert!(!api.client_message().contains("/var/lib"));
    }
}
