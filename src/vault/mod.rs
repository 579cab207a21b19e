//! Vault data model.
//!
//! This module provides:
//! - `Secret` and `SecretKind` records (`secret`)
//! - `Digest` summaries and digest sets (`digest`)
//! - Structured plaintext payloads (`payload`)

pub mod digest;
mod encoding;
pub mod payload;
pub mod secret;

// Re-export the most commonly used items.
pub use digest::{digests_of, index, Digest, DigestSet};
pub use payload::{BankCard, LoginPassword};
pub use secret::{next_version, now_version, Secret, SecretId, SecretKind, Version};
