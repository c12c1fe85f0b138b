//! Error types shared by every storage provider.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during provider operations.
///
/// Backends and the encrypting decorator report through the same type, so a
/// caller written against one provider handles every other provider too.
/// Errors raised by a backend are passed through the decorator untouched;
/// use [`StorageError::is_backend`] to tell them apart from cryptographic or
/// permission failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The provider or cipher cannot run in this environment.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// The passphrase was rejected before key derivation.
    #[error("invalid passphrase: {0}")]
    InvalidPassphrase(String),

    /// A mutation was attempted on a read-only context.
    #[error("write not permitted on a read-only context")]
    WriteNotPermitted,

    /// A stored envelope could not be decrypted.
    #[error("decryption failed for key {key:?}: {message}")]
    DecryptionFailed {
        /// The record key being read.
        key: String,
        /// Why decryption failed.
        message: String,
    },

    /// A value could not be encrypted.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The provider has not been opened yet.
    #[error("provider is not open")]
    NotOpen,

    /// The provider has been closed.
    #[error("provider is closed")]
    Closed,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing store is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store.
    #[error("storage locked: another process has exclusive access")]
    Locked,

    /// A backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// A typed value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Broad classification of a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raised locally by the cipher layer.
    Crypto,
    /// A capability restriction was violated.
    Permission,
    /// The provider lifecycle does not allow the operation.
    State,
    /// Raised by the backing store.
    Backend,
}

impl StorageError {
    /// Creates an unsupported environment error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedEnvironment(message.into())
    }

    /// Creates an invalid passphrase error.
    pub fn invalid_passphrase(message: impl Into<String>) -> Self {
        Self::InvalidPassphrase(message.into())
    }

    /// Creates a decryption failure for `key`.
    pub fn decryption_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an encryption failure.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed(message.into())
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedEnvironment(_)
            | Self::InvalidPassphrase(_)
            | Self::DecryptionFailed { .. }
            | Self::EncryptionFailed(_)
            | Self::Codec(_) => ErrorKind::Crypto,
            Self::WriteNotPermitted => ErrorKind::Permission,
            Self::NotOpen | Self::Closed => ErrorKind::State,
            Self::Io(_) | Self::Corrupted(_) | Self::Locked | Self::Backend(_) => {
                ErrorKind::Backend
            }
        }
    }

    /// Returns true if the error originated in the backing store.
    #[must_use]
    pub fn is_backend(&self) -> bool {
        self.kind() == ErrorKind::Backend
    }

    /// Returns true if a stored value failed to decrypt.
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::DecryptionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(StorageError::WriteNotPermitted.kind(), ErrorKind::Permission);
        assert_eq!(StorageError::NotOpen.kind(), ErrorKind::State);
        assert_eq!(StorageError::Closed.kind(), ErrorKind::State);
        assert_eq!(
            StorageError::decryption_failed("k", "bad mac").kind(),
            ErrorKind::Crypto
        );
        assert_eq!(StorageError::corrupted("crc").kind(), ErrorKind::Backend);
    }

    #[test]
    fn io_errors_are_backend() {
        let err: StorageError = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert!(err.is_backend());
        assert!(!StorageError::WriteNotPermitted.is_backend());
    }

    #[test]
    fn decryption_display_names_key() {
        let err = StorageError::decryption_failed("settings", "authentication failed");
        assert_eq!(
            err.to_string(),
            "decryption failed for key \"settings\": authentication failed"
        );
        assert!(err.is_decryption_failure());
    }
}
