//! Digests: the lightweight per-secret summary compared during sync.
//!
//! A digest carries fingerprints of the payload and description plus the
//! tombstone flag and version, never the payload itself. Both sides derive
//! digests from their own secrets with the same deterministic function.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::secret::{Secret, SecretId, Version};
use crate::crypto::fingerprint;

/// Digests keyed by secret id, iterated in ascending id order.
pub type DigestSet = BTreeMap<SecretId, Digest>;

/// Summary of one secret at the moment it was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub id: SecretId,
    #[serde(rename = "value_hash")]
    pub payload_hash: String,
    pub description_hash: String,
    #[serde(rename = "is_deleted")]
    pub deleted: bool,
    #[serde(rename = "ver")]
    pub version: Version,
}

impl Digest {
    /// Summarize `secret`.
    pub fn of(secret: &Secret) -> Self {
        Self::from_parts(
            secret.id,
            &secret.payload,
            &secret.description,
            secret.deleted,
            secret.version,
        )
    }

    /// Summarize the columns a store reads back, without building a `Secret`.
    pub fn from_parts(
        id: SecretId,
        payload: &[u8],
        description: &str,
        deleted: bool,
        version: Version,
    ) -> Self {
        Self {
            id,
            payload_hash: fingerprint(payload),
            description_hash: fingerprint(description.as_bytes()),
            deleted,
            version,
        }
    }

    /// The zero-value digest standing in for an id the other side lacks:
    /// minimal version, not deleted, empty hashes.
    pub fn absent(id: SecretId) -> Self {
        Self {
            id,
            payload_hash: String::new(),
            description_hash: String::new(),
            deleted: false,
            version: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Whether payload and description fingerprints both match `other`.
    pub fn same_content(&self, other: &Digest) -> bool {
        self.payload_hash == other.payload_hash && self.description_hash == other.description_hash
    }
}

/// Index a digest listing by id. Later duplicates replace earlier ones.
pub fn index<I>(digests: I) -> DigestSet
where
    I: IntoIterator<Item = Digest>,
{
    digests.into_iter().map(|d| (d.id, d)).collect()
}

/// Digests of the secrets in `secrets` that belong to `owner_id`.
pub fn digests_of<'a, I>(owner_id: &str, secrets: I) -> DigestSet
where
    I: IntoIterator<Item = &'a Secret>,
{
    secrets
        .into_iter()
        .filter(|s| s.owner_id == owner_id)
        .map(|s| (s.id, Digest::of(s)))
        .collect()
}
