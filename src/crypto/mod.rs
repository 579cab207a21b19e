//! Cryptographic primitives for keepsync.
//!
//! This module provides:
//! - AES-128-CBC payload encryption keyed by a passphrase (`cipher`)
//! - SHA-256 content fingerprints for sync digests (`fingerprint`)

pub mod cipher;
pub mod fingerprint;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, PassphraseKey, ...};
pub use cipher::{decrypt, encrypt, generate_passphrase, PassphraseKey};
pub use fingerprint::fingerprint;
