//! Example demonstrating submission tracing, including a rejected reuse.
//!
//! Run with: cargo run -p waybill-core --example submission_tracing

use std::sync::Arc;

use chrono::NaiveDate;
use tracing_subscriber::{fmt, EnvFilter};
use waybill_core::{
    Amount, Fingerprinter, LocalSubmissionLock, MemoryTripRepository, Platform, ProofUpload,
    Segment, Submitter, TripService, TripSubmission,
};

fn submission(initial: &[u8], final_: &[u8]) -> TripSubmission {
    TripSubmission {
        origin: "Curitiba".to_string(),
        destination: "Santos".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 5, 20).unwrap_or_default(),
        value: Amount::from_cents(150_000),
        platform: Platform::Ets2,
        segment: Segment::Truck,
        initial_proof: Some(ProofUpload::new(initial.to_vec(), "departure.png")),
        final_proof: Some(ProofUpload::new(final_.to_vec(), "arrival.png")),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("waybill_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Submission Tracing Demo ===\n");

    let service = TripService::new(
        Arc::new(MemoryTripRepository::new()),
        Arc::new(LocalSubmissionLock::new()),
        Fingerprinter::new(),
    );
    let ana = Submitter {
        driver_id: "p_ana".to_string(),
        driver_name: "Ana".to_string(),
        company_name: Some("Rota Sul".to_string()),
    };
    let bruno = Submitter {
        driver_id: "p_bruno".to_string(),
        driver_name: "Bruno".to_string(),
        company_name: None,
    };

    match service
        .submit_trip(&ana, submission(b"screenshot one", b"screenshot two"))
        .await
    {
        Ok(trip) => println!("\nStored {} ({})\n", trip.id, trip.initial_fingerprint.short()),
        Err(e) => println!("\nFailed: {}\n", e),
    }

    // Bruno reuses Ana's arrival screenshot as his departure proof
    match service
        .submit_trip(&bruno, submission(b"screenshot two", b"screenshot three"))
        .await
    {
        Ok(trip) => println!("\nUnexpectedly stored {}", trip.id),
        Err(e) => println!("\nRejected: {}", e),
    }
}
