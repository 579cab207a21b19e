//! Structured plaintext payloads for the kinds that have one.
//!
//! `login_password` and `bank_cards` secrets are JSON objects before
//! encryption; `text` and `binary` are raw bytes.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KeepSyncError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginPassword {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BankCard {
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub card_holder_name: String,
}

/// Serialize a structured payload to the bytes that get encrypted.
pub fn to_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(payload).map_err(|e| KeepSyncError::SerializationError(e.to_string()))
}

/// Parse decrypted bytes back into a structured payload.
pub fn from_bytes<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| KeepSyncError::Decode(e.to_string()))
}
