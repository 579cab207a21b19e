use thiserror::Error;
use uuid::Uuid;

/// All errors that can occur in keepsync.
#[derive(Debug, Error)]
pub enum KeepSyncError {
    // --- Crypto errors ---
    #[error("Passphrase must be at least {min} bytes (got {got})")]
    InvalidPassphrase { min: usize, got: usize },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed; wrong passphrase or corrupted data")]
    DecryptionFailed,

    // --- Store errors ---
    #[error("Secret '{0}' not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Operation cancelled")]
    Cancelled,

    // --- Sync errors ---
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("Server is not reachable: {0}")]
    Liveness(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl KeepSyncError {
    /// Returns `true` for the errors that mean "skip this cycle" rather
    /// than "something broke".
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            KeepSyncError::Liveness(_) | KeepSyncError::DeadlineExceeded | KeepSyncError::Cancelled
        )
    }
}

/// Convenience type alias for keepsync results.
pub type Result<T> = std::result::Result<T, KeepSyncError>;
