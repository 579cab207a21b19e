//! The `Secret` record and its kind tag.
//!
//! A secret is the full record both sides of a sync exchange: an opaque
//! (encrypted) payload plus the metadata the reconciler needs. Field names
//! on the wire follow the sync server's JSON (`value`, `secret_type`,
//! `is_deleted`, `ver`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::encoding::{base64_decode, base64_encode};
use crate::errors::{KeepSyncError, Result};

/// Globally unique, opaque secret identifier.
pub type SecretId = Uuid;

/// Timestamp of a secret's last mutation.
pub type Version = DateTime<Utc>;

/// The closed set of secret kinds.
///
/// Serialized only through `kind_wire`, which writes `as_str()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    LoginPassword,
    BankCard,
    Text,
    Binary,
}

impl SecretKind {
    pub const ALL: [SecretKind; 4] = [
        SecretKind::LoginPassword,
        SecretKind::BankCard,
        SecretKind::Text,
        SecretKind::Binary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginPassword => "login_password",
            Self::BankCard => "bank_cards",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretKind {
    type Err = KeepSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "login_password" | "login" | "credential" => Ok(Self::LoginPassword),
            "bank_cards" | "bank_card" | "card" => Ok(Self::BankCard),
            "text" => Ok(Self::Text),
            "binary" => Ok(Self::Binary),
            other => {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                Err(KeepSyncError::Decode(format!(
                    "unknown secret type '{other}' (expected one of: {})",
                    known.join(", ")
                )))
            }
        }
    }
}

/// A single secret record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub id: SecretId,

    /// The owner partition. Never changes once created.
    pub owner_id: String,

    /// Opaque payload bytes, ciphertext once the cipher has been applied.
    #[serde(
        rename = "value",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub payload: Vec<u8>,

    #[serde(rename = "secret_type", with = "kind_wire")]
    pub kind: SecretKind,

    pub description: String,

    /// Tombstone flag. Deleted secrets are kept so deletion syncs.
    #[serde(rename = "is_deleted")]
    pub deleted: bool,

    #[serde(rename = "ver")]
    pub version: Version,
}

impl Secret {
    /// Create a live secret with a fresh id and the current version.
    pub fn new(owner_id: &str, kind: SecretKind, description: &str, payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            payload,
            kind,
            description: description.to_string(),
            deleted: false,
            version: now_version(),
        }
    }

    /// Bump the version to a value strictly greater than the current one.
    pub fn touch(&mut self) {
        self.version = next_version(self.version);
    }

    /// Replace the description and bump the version.
    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
        self.touch();
    }

    /// Mark as deleted and bump the version.
    pub fn tombstone(&mut self) {
        self.deleted = true;
        self.touch();
    }
}

/// Current time at microsecond precision, the finest every backend keeps.
pub fn now_version() -> Version {
    Utc::now().trunc_subsecs(6)
}

/// The next version after `previous`: now, or `previous + 1µs` if the
/// clock has not moved past it.
pub fn next_version(previous: Version) -> Version {
    let now = now_version();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

/// Wire form of `SecretKind`, tolerant of the aliases accepted by `FromStr`.
mod kind_wire {
    use super::SecretKind;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &SecretKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(kind.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretKind, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_is_strictly_monotonic() {
        let mut secret = Secret::new("alice", SecretKind::Text, "note", vec![1, 2, 3]);
        let mut last = secret.version;
        for _ in 0..100 {
            secret.touch();
            assert!(secret.version > last);
            last = secret.version;
        }
    }

    #[test]
    fn touch_survives_a_future_version() {
        let mut secret = Secret::new("alice", SecretKind::Text, "note", vec![]);
        let future = Utc::now() + chrono::Duration::hours(1);
        secret.version = future;
        secret.touch();
        assert_eq!(secret.version, future + chrono::Duration::microseconds(1));
    }

    #[test]
    fn tombstone_keeps_id_and_bumps_version() {
        let mut secret = Secret::new("alice", SecretKind::Binary, "blob", vec![9]);
        let (id, before) = (secret.id, secret.version);
        secret.tombstone();
        assert!(secret.deleted);
        assert_eq!(secret.id, id);
        assert!(secret.version > before);
    }

    #[test]
    fn json_uses_server_field_names() {
        let secret = Secret::new("alice", SecretKind::BankCard, "visa", b"abc".to_vec());
        let json = serde_json::to_value(&secret).unwrap();
        assert_eq!(json["owner_id"], "alice");
        assert_eq!(json["value"], "YWJj");
        assert_eq!(json["secret_type"], "bank_cards");
        assert_eq!(json["is_deleted"], false);
        assert!(json.get("ver").is_some());

        let back: Secret = serde_json::from_value(json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn null_value_decodes_as_empty_payload() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "owner_id": "bob",
            "value": null,
            "secret_type": "text",
            "description": "",
            "is_deleted": true,
            "ver": "2024-01-01T00:00:00Z",
        });
        let secret: Secret = serde_json::from_value(json).unwrap();
        assert!(secret.payload.is_empty());
        assert!(secret.deleted);
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("card".parse::<SecretKind>().unwrap(), SecretKind::BankCard);
        assert_eq!(
            "login_password".parse::<SecretKind>().unwrap(),
            SecretKind::LoginPassword
        );
        assert!("photo".parse::<SecretKind>().is_err());
    }
}
