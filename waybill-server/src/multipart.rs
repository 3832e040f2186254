//! Multipart form parsing helpers
//!
//! Collects the file and text fields of a multipart/form-data upload so
//! handlers can pick them by name.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File fields indexed by name
    files: HashMap<String, FileField>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// Fields named in `file_fields` are read as files, validated for
    /// Content-Type and capped at `max_file_size` bytes. Everything else is
    /// read as text.
    pub async fn parse(
        multipart: &mut Multipart,
        file_fields: &[&str],
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if file_fields.contains(&name.as_str()) {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());
                validate_content_type(content_type.as_deref())?;

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("Failed to read file '{}': {}", name, e))
                    })?
                    .to_vec();
                validate_file_size(data.len(), max_file_size)?;

                fields.files.insert(
                    name,
                    FileField {
                        data,
                        content_type,
                        file_name,
                    },
                );
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Remove and return a file field
    pub fn take_file(&mut self, name: &str) -> Option<FileField> {
        self.files.remove(name)
    }

    /// Get a text field value
    ///
    /// Returns `None` if the field is not present.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// Get a required, non-blank text field
    pub fn require_text(&self, name: &str) -> Result<&str, ApiError> {
        self.get_text(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("Missing required field '{}'", name)))
    }

    /// Get a required text field parsed with `FromStr`
    pub fn parse_text<T>(&self, name: &str) -> Result<T, ApiError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.require_text(name)?
            .parse()
            .map_err(|e| ApiError::bad_request(format!("Invalid {}: {}", name, e)))
    }
}
