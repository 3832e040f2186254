//! JSON file stores used by the CLI and by file-backed server deployments.
//!
//! Several processes may share one trip file. Every write holds an
//! exclusive lock on `<store>.lock` across load, check and save, and
//! [`FileSubmissionLock`] extends the same guarantee to a whole
//! submission through `<store>.submit.lock`. The submission lock is
//! always taken before the store lock.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{check_append, ProfileRepository, SubmissionGuard, SubmissionLock, TripRepository};
use crate::envelope::{decode_trips, TripEnvelope};
use crate::error::{Result, WaybillError};
use crate::model::{ProfileRecord, TripRecord};

/// Trip collection persisted as a versioned envelope.
///
/// A missing file reads as an empty collection. Each write goes to its own
/// temporary file in the store's directory that is then renamed over the
/// original, so readers see either the old or the new collection.
#[derive(Debug)]
pub struct JsonFileTripRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTripRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cross-process lock serializing whole submissions against this store.
    pub fn submission_lock(&self) -> FileSubmissionLock {
        FileSubmissionLock::new(sibling(&self.path, "submit.lock"))
    }
}

#[async_trait]
impl TripRepository for JsonFileTripRepository {
    async fn list_all(&self) -> Result<Vec<TripRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => decode_store(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(WaybillError::storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn append(&self, trip: TripRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_locked(&path, trip))
            .await
            .map_err(|e| WaybillError::storage(format!("Trip store task failed: {}", e)))?
    }
}

/// Exclusive advisory lock on a file shared by every process using a store.
///
/// The lock is released when the returned guard is dropped.
#[derive(Debug, Clone)]
pub struct FileSubmissionLock {
    path: PathBuf,
}

impl FileSubmissionLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SubmissionLock for FileSubmissionLock {
    async fn acquire(&self) -> Result<SubmissionGuard> {
        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || lock_exclusive(&path))
            .await
            .map_err(|e| WaybillError::storage(format!("Lock task failed: {}", e)))??;
        Ok(SubmissionGuard::new(file))
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn lock_exclusive(lock_path: &Path) -> Result<File> {
    std::fs::create_dir_all(parent_dir(lock_path)).map_err(|e| {
        WaybillError::storage(format!("Failed to create {}: {}", parent_dir(lock_path).display(), e))
    })?;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| {
            WaybillError::storage(format!("Failed to open lock {}: {}", lock_path.display(), e))
        })?;
    file.lock_exclusive().map_err(|e| {
        WaybillError::storage(format!("Failed to lock {}: {}", lock_path.display(), e))
    })?;
    Ok(file)
}

fn decode_store(bytes: &[u8]) -> Result<Vec<TripRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    decode_trips(bytes)
}

fn append_locked(path: &Path, trip: TripRecord) -> Result<()> {
    let _lock = lock_exclusive(&sibling(path, "lock"))?;

    let mut trips = match std::fs::read(path) {
        Ok(bytes) => decode_store(&bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(WaybillError::storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };
    check_append(&trips, &trip)?;
    trips.push(trip);

    let bytes = TripEnvelope::new(trips).encode()?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path)).map_err(|e| {
        WaybillError::storage(format!("Failed to create temp file for {}: {}", path.display(), e))
    })?;
    tmp.write_all(&bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| WaybillError::storage(format!("Failed to write {}: {}", tmp.path().display(), e)))?;
    tmp.persist(path).map_err(|e| {
        WaybillError::storage(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Saved trip store");
    Ok(())
}

/// Profiles read from a JSON array on every call.
#[derive(Debug, Clone)]
pub struct JsonFileProfileRepository {
    path: PathBuf,
}

impl JsonFileProfileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileRepository for JsonFileProfileRepository {
    async fn list_all(&self) -> Result<Vec<ProfileRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(WaybillError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::error::CURRENT_SCHEMA_VERSION;
    use crate::fingerprint::Fingerprint;
    use crate::model::{Amount, Platform, Segment};

    fn trip(id: &str, initial: &[u8], final_: &[u8]) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            driver_id: "u1".to_string(),
            driver_name: "Ana".to_string(),
            company_name: Some("Rota Sul".to_string()),
            origin: "Cuiaba".to_string(),
            destination: "Palmas".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 9).unwrap(),
            value_cents: Amount::from_cents(123_456),
            platform: Platform::Ets2,
            segment: Segment::Truck,
            initial_fingerprint: Fingerprint::of(initial),
            final_fingerprint: Fingerprint::of(final_),
            initial_proof_ref: "inicio.jpg".to_string(),
            final_proof_ref: "fim.jpg".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileTripRepository::new(dir.path().join("trips.json"));
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_persists_versioned_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trips.json");
        let repo = JsonFileTripRepository::new(&path);

        repo.append(trip("t_1", b"a", b"b")).await.unwrap();
        repo.append(trip("t_2", b"c", b"d")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["schema_version"], CURRENT_SCHEMA_VERSION);
        assert_eq!(raw["trips"].as_array().unwrap().len(), 2);

        // a fresh handle sees the same data
        let reopened = JsonFileTripRepository::new(&path);
        let trips = reopened.list_all().await.unwrap();
        assert_eq!(trips[1].id, "t_2");
        assert_eq!(trips[0].value_cents, Amount::from_cents(123_456));

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name != "trips.json" && name != "trips.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_append_rejects_reused_proof() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileTripRepository::new(dir.path().join("trips.json"));
        repo.append(trip("t_1", b"a", b"b")).await.unwrap();

        let err = repo.append(trip("t_2", b"b", b"z")).await.unwrap_err();
        assert!(matches!(err, WaybillError::DuplicateProof { .. }));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_schema_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        std::fs::write(&path, r#"{"schema_version":99,"trips":[]}"#).unwrap();

        let repo = JsonFileTripRepository::new(&path);
        assert!(matches!(
            repo.list_all().await,
            Err(WaybillError::UnsupportedSchemaVersion(99, _))
        ));
    }

    #[tokio::test]
    async fn test_submission_lock_is_exclusive_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        let first = JsonFileTripRepository::new(&path).submission_lock();
        let second = JsonFileTripRepository::new(&path).submission_lock();
        assert_eq!(first.path(), dir.path().join("trips.json.submit.lock"));

        let guard = first.acquire().await.unwrap();
        let waiting =
            tokio::time::timeout(std::time::Duration::from_millis(50), second.acquire()).await;
        assert!(waiting.is_err(), "a second handle must wait for the held lock");

        drop(guard);
        assert!(second.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_profiles_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"[{"id":"u1","name":"Ana","status":"APPROVED","category":"DRIVER"},
                {"id":"u2","name":"Bia","status":"PENDING","category":"GROUPING"}]"#,
        )
        .unwrap();

        let repo = JsonFileProfileRepository::new(&path);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
        assert_eq!(repo.get("u2").await.unwrap().unwrap().name, "Bia");
        assert!(repo.get("u3").await.unwrap().is_none());
    }
}
