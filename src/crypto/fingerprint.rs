//! Content fingerprints used by digests.
//!
//! SHA-256, rendered as lowercase hex. Both sides of a sync compute these
//! independently, so the function must stay stable across releases.

use sha2::{Digest as _, Sha256};

/// Hex-encoded SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn differs_for_different_input() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }
}
