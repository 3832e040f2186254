#![no_main]

//! Fuzz target for trip store decoding and the duplicate check over it
//!
//! Run with: cargo +nightly fuzz run fuzz_trip_envelope

use libfuzzer_sys::fuzz_target;
use waybill_core::{decode_trips, find_duplicate, Fingerprint};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail, never panic
    if let Ok(trips) = decode_trips(data) {
        let candidate = Fingerprint::of(data);
        let _ = find_duplicate(candidate.as_str(), candidate.as_str(), &trips);

        if let Some(trip) = trips.first() {
            let found = find_duplicate(
                trip.initial_fingerprint.as_str(),
                candidate.as_str(),
                &trips,
            );
            assert!(matches!(found, Ok(Some(_))));
        }
    }
});
