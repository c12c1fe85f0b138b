//! Mapping from cipher-layer errors to the provider taxonomy.

use sealstore_crypto::CryptoError;
use sealstore_storage::StorageError;

/// Converts a construction or encryption failure.
pub(crate) fn from_crypto(err: CryptoError) -> StorageError {
    match err {
        CryptoError::InvalidPassphrase { message } => StorageError::InvalidPassphrase(message),
        CryptoError::KeyDerivation { message } => {
            StorageError::unsupported(format!("key derivation failed: {message}"))
        }
        CryptoError::UnknownAlgorithm { name } => {
            StorageError::unsupported(format!("unknown cipher algorithm: {name}"))
        }
        CryptoError::EncryptionFailed { message } => StorageError::EncryptionFailed(message),
        CryptoError::DecryptionFailed { message } => StorageError::decryption_failed("", message),
        err @ CryptoError::InvalidKeySize { .. } => StorageError::encryption_failed(err.to_string()),
    }
}

/// Converts a failure to open the envelope stored under `key`.
pub(crate) fn decryption(key: &str, err: CryptoError) -> StorageError {
    match err {
        CryptoError::DecryptionFailed { message } => StorageError::decryption_failed(key, message),
        other => StorageError::decryption_failed(key, other.to_string()),
    }
}
