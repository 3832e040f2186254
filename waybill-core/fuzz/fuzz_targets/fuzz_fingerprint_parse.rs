#![no_main]

//! Fuzz target for Fingerprint::parse()
//!
//! Accepted values must always be 64 lowercase hex characters.
//!
//! Run with: cargo +nightly fuzz run fuzz_fingerprint_parse

use libfuzzer_sys::fuzz_target;
use waybill_core::{Fingerprint, FINGERPRINT_HEX_LEN};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(fp) = Fingerprint::parse(text) {
        assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
        assert!(fp
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert_eq!(Fingerprint::parse(fp.as_str()).ok(), Some(fp));
    }
});
