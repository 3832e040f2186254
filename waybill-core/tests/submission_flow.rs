//! End-to-end submission and ranking over a file-backed trip store.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use waybill_core::{
    Amount, Fingerprint, Fingerprinter, JsonFileTripRepository, LocalSubmissionLock,
    MemoryProfileRepository, MemorySnapshotRepository, Platform, ProfileRecord, ProofUpload,
    RankAxis, RankingQuery, RankingService, Segment, Submitter, TripRecord, TripRepository,
    TripService, TripSubmission, UserCategory, UserStatus, WaybillError,
};

fn profile(id: &str, name: &str, category: UserCategory, company: Option<&str>) -> ProfileRecord {
    ProfileRecord {
        id: id.to_string(),
        name: name.to_string(),
        status: UserStatus::Approved,
        category,
        company_name: company.map(str::to_string),
        platforms: vec![Platform::Wtds],
        segment: Segment::Both,
        photo_url: String::new(),
        logo_url: None,
        flag_url: None,
    }
}

fn trip(initial: &[u8], final_: &[u8], value: &str, segment: Segment) -> TripSubmission {
    TripSubmission {
        origin: "Campinas".to_string(),
        destination: "Uberlandia".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
        value: Amount::parse(value).unwrap(),
        platform: Platform::Wtds,
        segment,
        initial_proof: Some(ProofUpload::new(initial.to_vec(), "inicio.jpg")),
        final_proof: Some(ProofUpload::new(final_.to_vec(), "fim.jpg")),
    }
}

fn trip_service(repo: Arc<JsonFileTripRepository>) -> TripService {
    TripService::new(repo, Arc::new(LocalSubmissionLock::new()), Fingerprinter::new())
}

/// What a separate `waybill submit` process builds for itself.
fn independent_service(path: &Path) -> TripService {
    let repo = JsonFileTripRepository::new(path);
    let lock = repo.submission_lock();
    TripService::new(Arc::new(repo), Arc::new(lock), Fingerprinter::new())
}

async fn race(
    path: &Path,
    submitters: usize,
    shared_initial: bool,
) -> Vec<Result<TripRecord, WaybillError>> {
    let ana = Submitter::from(&profile("ana", "Ana", UserCategory::Driver, None));
    let mut handles = Vec::new();
    for n in 0..submitters {
        let service = independent_service(path);
        let ana = ana.clone();
        let initial = if shared_initial {
            b"shared departure".to_vec()
        } else {
            format!("departure {n}").into_bytes()
        };
        let final_ = format!("arrival {n}").into_bytes();
        handles.push(tokio::spawn(async move {
            service
                .submit_trip(&ana, trip(&initial, &final_, "100", Segment::Truck))
                .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("submission task panicked"));
    }
    results
}

#[tokio::test]
async fn test_reused_proof_is_rejected_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trips.json");

    let ana = Submitter::from(&profile("ana", "Ana", UserCategory::Driver, None));
    let first = trip_service(Arc::new(JsonFileTripRepository::new(&path)))
        .submit_trip(&ana, trip(b"start-1", b"end-1", "1000", Segment::Truck))
        .await
        .expect("first trip should be recorded");

    // A new process reading the same file still sees the proof
    let reopened = Arc::new(JsonFileTripRepository::new(&path));
    let bia = Submitter::from(&profile("bia", "Bia", UserCategory::Driver, None));
    let err = trip_service(reopened.clone())
        .submit_trip(&bia, trip(b"end-1", b"start-2", "500", Segment::Truck))
        .await
        .expect_err("reused proof must be rejected");

    match err {
        WaybillError::DuplicateProof {
            fingerprint,
            trip_id,
        } => {
            assert_eq!(trip_id, first.id);
            assert_eq!(fingerprint, Fingerprint::of(b"end-1").to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(reopened.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_company_leaderboard_from_submissions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let trips = Arc::new(JsonFileTripRepository::new(dir.path().join("trips.json")));

    let owners = vec![
        profile("x", "Xavier", UserCategory::Entrepreneur, Some("Alpha Logistics")),
        profile("y", "Yara", UserCategory::Entrepreneur, Some("Alpha Logistics")),
        profile("z", "Zeca", UserCategory::Entrepreneur, Some("Beta Cargo")),
    ];
    let service = trip_service(trips.clone());
    service
        .submit_trip(&Submitter::from(&owners[0]), trip(b"a1", b"a2", "1000", Segment::Bus))
        .await
        .unwrap();
    service
        .submit_trip(&Submitter::from(&owners[1]), trip(b"a3", b"a4", "2000", Segment::Truck))
        .await
        .unwrap();
    service
        .submit_trip(&Submitter::from(&owners[2]), trip(b"b1", b"b2", "2500,50", Segment::Truck))
        .await
        .unwrap();

    let ranking = RankingService::new(
        trips,
        Arc::new(MemoryProfileRepository::new(owners)),
        Arc::new(MemorySnapshotRepository::new()),
    );
    let entries = ranking
        .get_ranking(&RankingQuery::new(
            RankAxis::Entrepreneur,
            Platform::Wtds,
            Segment::Both,
        ))
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].display_name, "Alpha Logistics");
    assert_eq!(entries[0].total_value_cents, Amount::from_cents(300_000));
    assert_eq!(entries[0].trip_count, 2);
    assert_eq!(entries[1].display_name, "Beta Cargo");
    assert_eq!(entries[1].total_value_cents.to_string(), "2500.50");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_writers_keep_every_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trips.json");

    let results = race(&path, 16, false).await;
    for result in &results {
        assert!(result.is_ok(), "submission failed: {result:?}");
    }

    let stored = JsonFileTripRepository::new(&path).list_all().await.unwrap();
    assert_eq!(stored.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_writers_accept_a_shared_proof_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trips.json");

    let results = race(&path, 16, true).await;
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(
            matches!(err, WaybillError::DuplicateProof { .. }),
            "unexpected error: {err:?}"
        );
    }

    let stored = JsonFileTripRepository::new(&path).list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
}
