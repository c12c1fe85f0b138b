//! Error types for cryptographic operations.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in key derivation, encryption or decryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The passphrase does not satisfy the derivation requirements.
    #[error("invalid passphrase: {message}")]
    InvalidPassphrase {
        /// Why the passphrase was rejected.
        message: String,
    },

    /// The key derivation function failed.
    #[error("key derivation failed: {message}")]
    KeyDerivation {
        /// Description of the failure.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (malformed envelope, wrong key or wrong algorithm).
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The algorithm name is not recognised.
    #[error("unknown cipher algorithm: {name}")]
    UnknownAlgorithm {
        /// The name that failed to parse.
        name: String,
    },

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },
}

impl CryptoError {
    /// Creates an invalid passphrase error.
    pub fn invalid_passphrase(message: impl Into<String>) -> Self {
        Self::InvalidPassphrase {
            message: message.into(),
        }
    }

    /// Creates a key derivation error.
    pub fn key_derivation(message: impl Into<String>) -> Self {
        Self::KeyDerivation {
            message: message.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Returns true if this error came from a failed decryption.
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::DecryptionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = CryptoError::decryption_failed("mac mismatch");
        assert_eq!(err.to_string(), "decryption failed: mac mismatch");
    }

    #[test]
    fn key_size_display() {
        let err = CryptoError::invalid_key_size(16, 32);
        assert_eq!(
            err.to_string(),
            "invalid key size: expected 32 bytes, got 16"
        );
    }

    #[test]
    fn decryption_failure_predicate() {
        assert!(CryptoError::decryption_failed("x").is_decryption_failure());
        assert!(!CryptoError::invalid_passphrase("x").is_decryption_failure());
    }
}
