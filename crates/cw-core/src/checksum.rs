//! SHA-256 checksum utilities for dead-letter payload identity.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Deterministic idempotency key for a dead-letter event.
///
/// Hashes `source:offset:checksum`; a missing offset contributes an empty
/// segment. Matches the expression used by the PostgreSQL backfill.
pub fn idempotency_key(source: &str, source_offset: Option<i64>, payload_checksum: &str) -> String {
    let offset = source_offset.map(|o| o.to_string()).unwrap_or_default();
    compute_checksum(&format!("{source}:{offset}:{payload_checksum}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            compute_checksum("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_idempotency_key_stable() {
        let a = idempotency_key("cowrie.json", Some(42), "deadbeef");
        let b = idempotency_key("cowrie.json", Some(42), "deadbeef");
        assert_eq!(a, b);
        assert_eq!(a, compute_checksum("cowrie.json:42:deadbeef"));
    }

    #[test]
    fn test_idempotency_key_missing_offset() {
        assert_eq!(
            idempotency_key("src", None, "c"),
            compute_checksum("src::c")
        );
        assert_ne!(
            idempotency_key("src", None, "c"),
            idempotency_key("src", Some(0), "c")
        );
    }
}
