//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use std::io;

use waybill_core::WaybillError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (duplicate proof, invalid trip, unreadable store).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot read or write a store).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            code: classify(err),
            message: Some(format!("{err:#}")),
        }
    }
}

/// Classify an error by the first recognised cause in its chain.
fn classify(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<WaybillError>() {
            return match e {
                WaybillError::Validation(_)
                | WaybillError::DuplicateProof { .. }
                | WaybillError::InvalidFingerprint(_)
                | WaybillError::Serialization(_)
                | WaybillError::UnsupportedSchemaVersion(..) => DATA_ERROR,
                WaybillError::Storage(_) | WaybillError::Computation(_) => IO_ERROR,
                WaybillError::Timeout { .. } | WaybillError::ConcurrencyConflict(_) => {
                    GENERAL_ERROR
                }
            };
        }
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            return match e.kind() {
                io::ErrorKind::NotFound => INPUT_ERROR,
                _ => IO_ERROR,
            };
        }
    }
    GENERAL_ERROR
}
