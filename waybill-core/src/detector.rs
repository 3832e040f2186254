//! Duplicate proof detection.
//!
//! Proof images live in one global namespace: a fingerprint seen on any
//! earlier trip, in either the initial or the final role, by any driver of
//! any company, can never be used again. The check is a pure set-membership
//! test and never mutates anything.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, WaybillError};
use crate::fingerprint::Fingerprint;
use crate::model::TripRecord;

/// Which proof slot a fingerprint occupies on a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofRole {
    Initial,
    Final,
}

impl std::fmt::Display for ProofRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::Final => f.write_str("final"),
        }
    }
}

/// A candidate fingerprint that collides with the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMatch {
    pub fingerprint: Fingerprint,
    /// Slot of the candidate in the new submission
    pub candidate_role: ProofRole,
    /// Trip that already uses the fingerprint
    pub existing_trip_id: String,
    /// Slot the fingerprint occupies on the existing trip
    pub existing_role: ProofRole,
}

impl From<DuplicateMatch> for WaybillError {
    fn from(m: DuplicateMatch) -> Self {
        WaybillError::DuplicateProof {
            fingerprint: m.fingerprint.to_string(),
            trip_id: m.existing_trip_id,
        }
    }
}

/// Every proof fingerprint of a trip history, in both roles.
#[derive(Debug, Default)]
pub struct ProofIndex<'a> {
    seen: HashMap<&'a Fingerprint, (&'a str, ProofRole)>,
}

impl<'a> ProofIndex<'a> {
    pub fn build(history: &'a [TripRecord]) -> Self {
        let mut seen = HashMap::with_capacity(history.len() * 2);
        for trip in history {
            seen.entry(&trip.initial_fingerprint)
                .or_insert((trip.id.as_str(), ProofRole::Initial));
            seen.entry(&trip.final_fingerprint)
                .or_insert((trip.id.as_str(), ProofRole::Final));
        }
        Self { seen }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn lookup(&self, fingerprint: &Fingerprint, role: ProofRole) -> Option<DuplicateMatch> {
        self.seen
            .get(fingerprint)
            .map(|(trip_id, existing_role)| DuplicateMatch {
                fingerprint: fingerprint.clone(),
                candidate_role: role,
                existing_trip_id: (*trip_id).to_string(),
                existing_role: *existing_role,
            })
    }
}

/// Look for a collision between the candidates and the history.
///
/// Candidates are given in their rendered form; an empty or malformed value
/// is an [`WaybillError::InvalidFingerprint`], never a pass.
pub fn find_duplicate(
    initial: &str,
    final_: &str,
    history: &[TripRecord],
) -> Result<Option<DuplicateMatch>> {
    let initial = Fingerprint::parse(initial)?;
    let final_ = Fingerprint::parse(final_)?;
    Ok(find_duplicate_parsed(&initial, &final_, history))
}

/// Same as [`find_duplicate`] for already-validated fingerprints.
pub fn find_duplicate_parsed(
    initial: &Fingerprint,
    final_: &Fingerprint,
    history: &[TripRecord],
) -> Option<DuplicateMatch> {
    let index = ProofIndex::build(history);
    index
        .lookup(initial, ProofRole::Initial)
        .or_else(|| index.lookup(final_, ProofRole::Final))
}

/// Fail with [`WaybillError::DuplicateProof`] if either candidate was seen before.
pub fn ensure_unique(
    initial: &Fingerprint,
    final_: &Fingerprint,
    history: &[TripRecord],
) -> Result<()> {
    match find_duplicate_parsed(initial, final_, history) {
        Some(found) => {
            warn!(
                fingerprint = %found.fingerprint.short(),
                candidate_role = %found.candidate_role,
                existing_trip = %found.existing_trip_id,
                existing_role = %found.existing_role,
                "Rejected reused proof image"
            );
            Err(found.into())
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::model::{Amount, Platform, Segment};

    fn trip(id: &str, driver: &str, initial: &[u8], final_: &[u8]) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            driver_id: driver.to_string(),
            driver_name: driver.to_uppercase(),
            company_name: None,
            origin: "Curitiba".to_string(),
            destination: "Santos".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            value_cents: Amount::from_cents(10_000),
            platform: Platform::Ets2,
            segment: Segment::Truck,
            initial_fingerprint: Fingerprint::of(initial),
            final_fingerprint: Fingerprint::of(final_),
            initial_proof_ref: String::new(),
            final_proof_ref: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn hex(data: &[u8]) -> String {
        Fingerprint::of(data).to_string()
    }

    #[test]
    fn test_empty_history_never_duplicates() {
        assert!(find_duplicate(&hex(b"x"), &hex(b"y"), &[]).unwrap().is_none());
    }

    #[test]
    fn test_every_role_combination_is_rejected() {
        let history = vec![trip("t_1", "ana", b"A", b"B")];

        // candidate initial vs existing initial/final, candidate final vs existing initial/final
        let cases: [(&[u8], &[u8], ProofRole, ProofRole); 4] = [
            (b"A", b"new", ProofRole::Initial, ProofRole::Initial),
            (b"B", b"new", ProofRole::Initial, ProofRole::Final),
            (b"new", b"A", ProofRole::Final, ProofRole::Initial),
            (b"new", b"B", ProofRole::Final, ProofRole::Final),
        ];

        for (initial, final_, candidate_role, existing_role) in cases {
            let found = find_duplicate(&hex(initial), &hex(final_), &history)
                .unwrap()
                .expect("reused proof must be detected");
            assert_eq!(found.candidate_role, candidate_role);
            assert_eq!(found.existing_role, existing_role);
            assert_eq!(found.existing_trip_id, "t_1");
        }
    }

    #[test]
    fn test_reuse_across_drivers_is_rejected() {
        let history = vec![trip("t_1", "ana", b"A", b"B"), trip("t_2", "bia", b"C", b"D")];
        let err = ensure_unique(&Fingerprint::of(b"D"), &Fingerprint::of(b"E"), &history)
            .unwrap_err();
        match err {
            WaybillError::DuplicateProof { trip_id, .. } => assert_eq!(trip_id, "t_2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fresh_proofs_pass() {
        let history = vec![trip("t_1", "ana", b"A", b"B")];
        assert!(ensure_unique(&Fingerprint::of(b"C"), &Fingerprint::of(b"D"), &history).is_ok());
    }

    #[test]
    fn test_order_independent() {
        let mut history = vec![
            trip("t_1", "ana", b"A", b"B"),
            trip("t_2", "bia", b"C", b"D"),
            trip("t_3", "caio", b"E", b"F"),
        ];
        let forward = find_duplicate(&hex(b"F"), &hex(b"Z"), &history)
            .unwrap()
            .is_some();
        history.reverse();
        let backward = find_duplicate(&hex(b"F"), &hex(b"Z"), &history)
            .unwrap()
            .is_some();
        assert!(forward && backward);
    }

    #[test]
    fn test_malformed_candidates_are_errors() {
        let history = vec![trip("t_1", "ana", b"A", b"B")];
        assert!(matches!(
            find_duplicate("", &hex(b"C"), &history),
            Err(WaybillError::InvalidFingerprint(_))
        ));
        assert!(matches!(
            find_duplicate(&hex(b"C"), "deadbeef", &history),
            Err(WaybillError::InvalidFingerprint(_))
        ));
    }

    #[test]
    fn test_index_counts_both_roles() {
        let history = vec![trip("t_1", "ana", b"A", b"B"), trip("t_2", "bia", b"C", b"D")];
        let index = ProofIndex::build(&history);
        assert_eq!(index.len(), 4);
        assert!(index.contains(&Fingerprint::of(b"C")));
        assert!(!index.contains(&Fingerprint::of(b"Z")));
    }
}
