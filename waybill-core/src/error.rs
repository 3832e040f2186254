use thiserror::Error;

/// Current version of the persisted trip collection envelope.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Length of a rendered SHA-256 fingerprint (lowercase hex).
pub const FINGERPRINT_HEX_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum WaybillError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate proof: fingerprint {fingerprint} already used by trip {trip_id}")]
    DuplicateProof { fingerprint: String, trip_id: String },

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Fingerprint computation failed: {0}")]
    Computation(String),

    #[error("Fingerprint computation timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Concurrent submission conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported schema version {0} (current: {1})")]
    UnsupportedSchemaVersion(u32, u32),
}

impl WaybillError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether retrying the same submission could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Computation(_) | Self::Timeout { .. } | Self::Storage(_)
        )
    }
}

impl From<serde_json::Error> for WaybillError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WaybillError>;
