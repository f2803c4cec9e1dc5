//! Content digests for persisted files.

use sha2::{Digest, Sha256};

/// Returns the hex-encoded SHA-256 digest of `content`.
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_is_deterministic() {
        assert_eq!(sha256_hex(b"<grammar/>"), sha256_hex(b"<grammar/>"));
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}
