//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use waybill_core::{
    Fingerprinter, JsonFileProfileRepository, JsonFileTripRepository, ProfileRecord,
    ProfileRepository, ProofUpload, TripService, WaybillError,
};

use crate::StoreArgs;

/// Trip service over the JSON trip store at `stores.store`.
///
/// Submissions lock the store file, so concurrent `waybill submit`
/// processes sharing a store are serialized.
pub fn trip_service(stores: &StoreArgs) -> TripService {
    let trips = JsonFileTripRepository::new(stores.store.clone());
    let lock = trips.submission_lock();
    TripService::new(Arc::new(trips), Arc::new(lock), Fingerprinter::new())
}

/// Look up an approved profile by id.
pub async fn approved_profile(stores: &StoreArgs, id: &str) -> Result<ProfileRecord> {
    let profiles = JsonFileProfileRepository::new(stores.profiles.clone());
    let profile = profiles
        .get(id)
        .await
        .with_context(|| format!("Failed to load profiles from {}", stores.profiles.display()))?
        .ok_or_else(|| WaybillError::validation(format!("Unknown profile '{}'", id)))?;

    if !profile.is_approved() {
        return Err(WaybillError::validation(format!(
            "Profile '{}' is not approved ({:?})",
            id, profile.status
        ))
        .into());
    }
    Ok(profile)
}

/// Read a proof image, labelled by its file name.
pub fn read_proof(path: &Path) -> Result<ProofUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read proof image: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read proof image");
    Ok(ProofUpload::new(bytes, file_label(path)))
}

/// File name of `path`, or the whole path when it has none.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("shots/departure.png")), "departure.png");
        assert_eq!(file_label(Path::new("arrival.jpg")), "arrival.jpg");
        assert_eq!(file_label(Path::new("/")), "/");
    }

    #[test]
    fn test_read_proof_missing_file() {
        let err = read_proof(Path::new("/no/such/proof.png")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read proof image"));
    }
}
