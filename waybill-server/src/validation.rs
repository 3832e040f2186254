//! Upload validation module
//!
//! Provides validation utilities for multipart proof uploads and form fields.

use chrono::NaiveDate;

use crate::error::ApiError;

/// Allowed MIME type categories for proof images
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Validates the Content-Type of an uploaded proof
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Parses a trip date given as `YYYY-MM-DD`
pub fn parse_trip_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::bad_request(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}
