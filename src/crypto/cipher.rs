//! AES-128-CBC payload encryption keyed by a user passphrase.
//!
//! The passphrase is split rather than stretched: its first 16 bytes are
//! the AES key and its last 16 bytes are the CBC initialization vector.
//! Plaintext is PKCS#7 padded, so the ciphertext is always a non-zero
//! multiple of the block size and carries no separate length field.
//!
//! There is no authentication tag. A corrupted ciphertext that still
//! unpads cleanly decrypts to garbage; one that does not unpad fails with
//! `DecryptionFailed`.

use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use uuid::Uuid;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{KeepSyncError, Result};

/// AES block length in bytes. Both the key and the IV are one block long.
pub const BLOCK_LEN: usize = 16;

/// Shortest passphrase that yields a key and an IV without overlap.
pub const MIN_PASSPHRASE_LEN: usize = 2 * BLOCK_LEN;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Encrypt `plaintext` with a 16-byte `key` and 16-byte `iv`.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| KeepSyncError::EncryptionFailed(format!("invalid key or iv length: {e}")))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt data that was produced by `encrypt` with the same key and IV.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(KeepSyncError::DecryptionFailed);
    }

    let cipher =
        Aes128CbcDec::new_from_slices(key, iv).map_err(|_| KeepSyncError::DecryptionFailed)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| KeepSyncError::DecryptionFailed)
}

/// Key and IV derived from a passphrase, wiped from memory on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PassphraseKey {
    key: [u8; BLOCK_LEN],
    iv: [u8; BLOCK_LEN],
}

impl PassphraseKey {
    /// Split `passphrase` into key (leading block) and IV (trailing block).
    ///
    /// Rejects passphrases shorter than [`MIN_PASSPHRASE_LEN`] bytes.
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        let bytes = passphrase.as_bytes();
        if bytes.len() < MIN_PASSPHRASE_LEN {
            return Err(KeepSyncError::InvalidPassphrase {
                min: MIN_PASSPHRASE_LEN,
                got: bytes.len(),
            });
        }

        let mut key = [0u8; BLOCK_LEN];
        let mut iv = [0u8; BLOCK_LEN];
        key.copy_from_slice(&bytes[..BLOCK_LEN]);
        iv.copy_from_slice(&bytes[bytes.len() - BLOCK_LEN..]);
        Ok(Self { key, iv })
    }

    /// Build from raw key and IV blocks.
    pub fn new(key: [u8; BLOCK_LEN], iv: [u8; BLOCK_LEN]) -> Self {
        Self { key, iv }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(plaintext, &self.key, &self.iv)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        decrypt(ciphertext, &self.key, &self.iv)
    }
}

/// Generate a fresh random passphrase (a hyphenated UUID, 36 bytes).
pub fn generate_passphrase() -> Zeroizing<String> {
    Zeroizing::new(Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; BLOCK_LEN] = [0x42; BLOCK_LEN];
    const IV: [u8; BLOCK_LEN] = [0x24; BLOCK_LEN];

    #[test]
    fn roundtrip_various_lengths() {
        for len in [0usize, 1, 5, 15, 16, 17, 31, 32, 100, 4096] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ct = encrypt(&plaintext, &KEY, &IV).unwrap();
            assert_eq!(ct.len() % BLOCK_LEN, 0);
            assert!(ct.len() > plaintext.len(), "padding always adds at least one byte");
            assert_eq!(decrypt(&ct, &KEY, &IV).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn block_aligned_input_gets_a_full_padding_block() {
        let ct = encrypt(&[7u8; 32], &KEY, &IV).unwrap();
        assert_eq!(ct.len(), 48);
    }

    #[test]
    fn encryption_is_deterministic_for_fixed_key_and_iv() {
        let a = encrypt(b"hello world", &KEY, &IV).unwrap();
        let b = encrypt(b"hello world", &KEY, &IV).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_key_length() {
        assert!(encrypt(b"x", &[0u8; 32], &IV).is_err());
        assert!(decrypt(&[0u8; 16], &KEY, &[0u8; 8]).is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let ct = encrypt(b"some secret text", &KEY, &IV).unwrap();
        assert!(matches!(
            decrypt(&ct[..ct.len() - 3], &KEY, &IV),
            Err(KeepSyncError::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt(&[], &KEY, &IV),
            Err(KeepSyncError::DecryptionFailed)
        ));
    }

    #[test]
    fn passphrase_split_uses_leading_and_trailing_blocks() {
        let passphrase = "0123456789abcdef----ghijklmnopqrstuv";
        let key = PassphraseKey::from_passphrase(passphrase).unwrap();
        assert_eq!(&key.key, b"0123456789abcdef");
        assert_eq!(&key.iv, b"ghijklmnopqrstuv");

        let ct = key.encrypt(b"card 4111").unwrap();
        assert_eq!(
            decrypt(&ct, b"0123456789abcdef", b"ghijklmnopqrstuv").unwrap(),
            b"card 4111"
        );
    }

    #[test]
    fn short_passphrase_is_rejected() {
        let err = PassphraseKey::from_passphrase("too-short").err().unwrap();
        assert!(matches!(
            err,
            KeepSyncError::InvalidPassphrase { min: 32, got: 9 }
        ));
    }

    #[test]
    fn generated_passphrase_is_usable() {
        let passphrase = generate_passphrase();
        assert_eq!(passphrase.len(), 36);
        let key = PassphraseKey::from_passphrase(&passphrase).unwrap();
        let ct = key.encrypt(b"").unwrap();
        assert!(key.decrypt(&ct).unwrap().is_empty());
    }
}
