//! Versioned on-disk form of the trip collection.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaybillError, CURRENT_SCHEMA_VERSION};
use crate::model::TripRecord;

/// Trip collection as persisted by file-backed stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripEnvelope {
    pub schema_version: u32,
    #[serde(default)]
    pub trips: Vec<TripRecord>,
}

impl TripEnvelope {
    pub fn new(trips: Vec<TripRecord>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            trips,
        }
    }

    /// Decode an envelope, refusing schema versions this build cannot read.
    ///
    /// The version is checked before any trip is decoded, so a newer store
    /// whose records changed shape is reported as a version mismatch.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        #[derive(Deserialize)]
        struct VersionHeader {
            schema_version: u32,
        }

        let header: VersionHeader = serde_json::from_slice(bytes)?;
        check_version(header.schema_version)?;
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

fn check_version(version: u32) -> Result<()> {
    if version == 0 || version > CURRENT_SCHEMA_VERSION {
        return Err(WaybillError::UnsupportedSchemaVersion(
            version,
            CURRENT_SCHEMA_VERSION,
        ));
    }
    Ok(())
}

/// Decode a trip collection given either as an envelope or as a bare array.
///
/// Malformed records fail with the line and column of the offending value.
pub fn decode_trips(bytes: &[u8]) -> Result<Vec<TripRecord>> {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') => Ok(serde_json::from_slice(bytes)?),
        _ => Ok(TripEnvelope::decode(bytes)?.trips),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_envelope() {
        let envelope = TripEnvelope::decode(br#"{"schema_version":1}"#).unwrap();
        assert!(envelope.trips.is_empty());
        assert_eq!(envelope.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_future_version_is_refused() {
        let err = TripEnvelope::decode(br#"{"schema_version":7,"trips":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            WaybillError::UnsupportedSchemaVersion(7, CURRENT_SCHEMA_VERSION)
        ));
        assert!(decode_trips(br#"{"schema_version":0,"trips":[]}"#).is_err());
    }

    #[test]
    fn test_version_is_checked_before_records() {
        let err = decode_trips(br#"{"schema_version":2,"trips":[{"id":"t_1","new_shape":true}]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            WaybillError::UnsupportedSchemaVersion(2, CURRENT_SCHEMA_VERSION)
        ));
    }

    #[test]
    fn test_malformed_record_names_the_problem() {
        let store = br#"{
  "schema_version": 1,
  "trips": [
    {
      "id": "t_1",
      "value_cents": -5
    }
  ]
}"#;
        let message = decode_trips(store).unwrap_err().to_string();
        assert!(message.contains("-5"), "{message}");
        assert!(message.contains("line 6"), "{message}");

        assert!(decode_trips(br#"{"trips":[]}"#)
            .unwrap_err()
            .to_string()
            .contains("schema_version"));
    }

    #[test]
    fn test_bare_array_is_accepted() {
        assert!(decode_trips(b"[]").unwrap().is_empty());
        assert!(matches!(
            decode_trips(b"{not json"),
            Err(WaybillError::Serialization(_))
        ));
    }
}
