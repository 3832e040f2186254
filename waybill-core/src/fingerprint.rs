//! Content fingerprints for proof-of-delivery images.
//!
//! A fingerprint is the SHA-256 digest of the exact bytes of an upload,
//! rendered as 64 lowercase hex characters. File names, MIME types and
//! timestamps never take part in the digest, so the same image uploaded
//! under a different name still yields the same fingerprint.

use std::fmt;
use std::io::{ErrorKind, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, WaybillError, FINGERPRINT_HEX_LEN};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Content-addressed identity of a proof image.
///
/// Always holds a well-formed lowercase SHA-256 hex digest; deserialization
/// goes through [`Fingerprint::parse`] so malformed values are rejected at
/// the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an in-memory payload.
    pub fn of(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Fingerprint a streamed payload.
    ///
    /// Read failures surface as [`WaybillError::Computation`].
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(WaybillError::Computation(format!(
                        "Failed to read payload: {}",
                        e
                    )))
                }
            }
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Parse a rendered fingerprint.
    ///
    /// Uppercase hex is accepted and normalized so that case can never be
    /// used to slip a reused proof past the duplicate check.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(WaybillError::InvalidFingerprint(
                "fingerprint is empty".to_string(),
            ));
        }
        if value.len() != FINGERPRINT_HEX_LEN {
            return Err(WaybillError::InvalidFingerprint(format!(
                "expected {} hex characters, got {}",
                FINGERPRINT_HEX_LEN,
                value.len()
            )));
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(WaybillError::InvalidFingerprint(format!(
                "'{}' is not a hex digest",
                value
            )));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the digest, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = WaybillError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "runtime")]
pub use self::runtime::{bounded, compute_fingerprint, Fingerprinter};

#[cfg(feature = "runtime")]
mod runtime {
    use std::future::Future;
    use std::time::Duration;

    use tracing::debug;

    use super::Fingerprint;
    use crate::error::{Result, WaybillError};

    /// Asynchronous fingerprint computation.
    ///
    /// Hashing runs on the blocking pool so large uploads never stall the
    /// executor. An optional bound turns a slow computation into
    /// [`WaybillError::Timeout`] instead of hanging the submission.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Fingerprinter {
        timeout: Option<Duration>,
    }

    impl Fingerprinter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_timeout(timeout: Duration) -> Self {
            Self {
                timeout: Some(timeout),
            }
        }

        pub fn timeout(&self) -> Option<Duration> {
            self.timeout
        }

        /// Fingerprint one payload.
        pub async fn fingerprint(&self, data: Vec<u8>) -> Result<Fingerprint> {
            let len = data.len();
            let task = tokio::task::spawn_blocking(move || Fingerprint::of(&data));
            let fingerprint = bounded(
                async move {
                    task.await.map_err(|e| {
                        WaybillError::Computation(format!("Fingerprint task failed: {}", e))
                    })
                },
                self.timeout,
            )
            .await?;

            debug!(bytes = len, fingerprint = %fingerprint.short(), "Computed fingerprint");
            Ok(fingerprint)
        }

        /// Fingerprint the initial and final proofs of a submission.
        ///
        /// The two computations are independent; their relative completion
        /// order is unspecified.
        pub async fn fingerprint_pair(
            &self,
            initial: Vec<u8>,
            final_: Vec<u8>,
        ) -> Result<(Fingerprint, Fingerprint)> {
            tokio::try_join!(self.fingerprint(initial), self.fingerprint(final_))
        }
    }

    /// One-off [`Fingerprinter::fingerprint`] with an optional bound.
    pub async fn compute_fingerprint(
        data: Vec<u8>,
        timeout: Option<Duration>,
    ) -> Result<Fingerprint> {
        Fingerprinter { timeout }.fingerprint(data).await
    }

    /// Run `fut`, failing with [`WaybillError::Timeout`] once `limit` elapses.
    pub async fn bounded<T, F>(fut: F, limit: Option<Duration>) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| WaybillError::Timeout {
                    millis: limit.as_millis() as u64,
                })?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "disk went away"))
        }
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(Fingerprint::of(b"").as_str(), SHA256_EMPTY);
        assert_eq!(Fingerprint::of(b"abc").as_str(), SHA256_ABC);
    }

    #[test]
    fn test_deterministic() {
        let payload = vec![0xFFu8; 4096];
        assert_eq!(Fingerprint::of(&payload), Fingerprint::of(&payload));
    }

    #[test]
    fn test_single_byte_difference_changes_digest() {
        let base: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let original = Fingerprint::of(&base);

        for index in [0usize, 1, 4_999, 9_999] {
            let mut tweaked = base.clone();
            tweaked[index] ^= 0x01;
            assert_ne!(
                Fingerprint::of(&tweaked),
                original,
                "flipping byte {} should change the digest",
                index
            );
        }
    }

    #[test]
    fn test_output_is_lowercase_hex_of_fixed_length() {
        let fp = Fingerprint::of(b"proof.jpg");
        assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
        assert!(fp
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn test_from_reader_matches_in_memory() {
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = Fingerprint::from_reader(payload.as_slice()).unwrap();
        assert_eq!(streamed, Fingerprint::of(&payload));
    }

    #[test]
    fn test_from_reader_failure_is_computation_error() {
        let err = Fingerprint::from_reader(FailingReader).unwrap_err();
        assert!(matches!(err, WaybillError::Computation(_)));
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert!(matches!(
            Fingerprint::parse(""),
            Err(WaybillError::InvalidFingerprint(_))
        ));
        assert!(matches!(
            Fingerprint::parse("abc123"),
            Err(WaybillError::InvalidFingerprint(_))
        ));
        let not_hex = "z".repeat(FINGERPRINT_HEX_LEN);
        assert!(matches!(
            Fingerprint::parse(&not_hex),
            Err(WaybillError::InvalidFingerprint(_))
        ));
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = SHA256_ABC.to_ascii_uppercase();
        assert_eq!(Fingerprint::parse(&upper).unwrap().as_str(), SHA256_ABC);
    }

    #[test]
    fn test_serde_validates() {
        let ok: Fingerprint = serde_json::from_str(&format!("\"{}\"", SHA256_ABC)).unwrap();
        assert_eq!(ok.as_str(), SHA256_ABC);
        assert!(serde_json::from_str::<Fingerprint>("\"not-a-digest\"").is_err());
    }

    #[cfg(feature = "runtime")]
    mod async_tests {
        use std::time::Duration;

        use super::*;

        #[tokio::test]
        async fn test_async_matches_sync() {
            let fp = Fingerprinter::new()
                .fingerprint(b"abc".to_vec())
                .await
                .unwrap();
            assert_eq!(fp.as_str(), SHA256_ABC);

            let bounded = compute_fingerprint(b"abc".to_vec(), Some(Duration::from_secs(5)))
                .await
                .unwrap();
            assert_eq!(bounded, fp);
        }

        #[tokio::test]
        async fn test_pair_keeps_roles() {
            let (initial, final_) = Fingerprinter::with_timeout(Duration::from_secs(5))
                .fingerprint_pair(b"abc".to_vec(), Vec::new())
                .await
                .unwrap();
            assert_eq!(initial.as_str(), SHA256_ABC);
            assert_eq!(final_.as_str(), SHA256_EMPTY);
        }

        #[tokio::test]
        async fn test_bounded_surfaces_timeout() {
            let result: Result<()> =
                bounded(std::future::pending(), Some(Duration::from_millis(10))).await;
            assert!(matches!(result, Err(WaybillError::Timeout { millis: 10 })));
        }
    }
}
