//! Serde helpers for base64-encoded `Vec<u8>` fields.
//!
//! Ciphertext travels as a standard-alphabet base64 string in JSON, which
//! is also how the sync server encodes byte fields.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // The server sends `null` for an empty byte slice.
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(s) => BASE64.decode(&s).map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}
