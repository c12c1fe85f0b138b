//! Derived key material.

use crate::algorithm::CipherAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the HMAC-SHA256 key in bytes.
pub const MAC_KEY_SIZE: usize = 32;

/// Key material bound to one cipher algorithm.
///
/// Holds the cipher key (sized for the algorithm) and a separate MAC key.
/// The bytes are zeroized when dropped and never appear in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    #[zeroize(skip)]
    algorithm: CipherAlgorithm,
    cipher_key: Vec<u8>,
    mac_key: [u8; MAC_KEY_SIZE],
}

impl DerivedKey {
    /// Creates a key from raw parts.
    ///
    /// # Errors
    ///
    /// Returns an error if `cipher_key` is not exactly
    /// [`CipherAlgorithm::key_len`] bytes.
    pub fn from_parts(
        algorithm: CipherAlgorithm,
        cipher_key: &[u8],
        mac_key: [u8; MAC_KEY_SIZE],
    ) -> CryptoResult<Self> {
        if cipher_key.len() != algorithm.key_len() {
            return Err(CryptoError::invalid_key_size(
                cipher_key.len(),
                algorithm.key_len(),
            ));
        }

        Ok(Self {
            algorithm,
            cipher_key: cipher_key.to_vec(),
            mac_key,
        })
    }

    /// Generates random key material for `algorithm`.
    #[must_use]
    pub fn generate(algorithm: CipherAlgorithm) -> Self {
        let mut rng = rand::thread_rng();
        let mut cipher_key = vec![0u8; algorithm.key_len()];
        rng.fill_bytes(&mut cipher_key);
        let mut mac_key = [0u8; MAC_KEY_SIZE];
        rng.fill_bytes(&mut mac_key);

        Self {
            algorithm,
            cipher_key,
            mac_key,
        }
    }

    /// The algorithm this key was derived for.
    #[must_use]
    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// Returns the cipher key bytes.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn cipher_key(&self) -> &[u8] {
        &self.cipher_key
    }

    /// Returns the MAC key bytes.
    #[must_use]
    pub fn mac_key(&self) -> &[u8; MAC_KEY_SIZE] {
        &self.mac_key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_sizes_key_for_algorithm() {
        for algorithm in CipherAlgorithm::ALL {
            let key = DerivedKey::generate(algorithm);
            assert_eq!(key.cipher_key().len(), algorithm.key_len());
            assert_eq!(key.algorithm(), algorithm);
        }
    }

    #[test]
    fn generated_keys_differ() {
        let key1 = DerivedKey::generate(CipherAlgorithm::Aes256Cbc);
        let key2 = DerivedKey::generate(CipherAlgorithm::Aes256Cbc);
        assert_ne!(key1.cipher_key(), key2.cipher_key());
        assert_ne!(key1.mac_key(), key2.mac_key());
    }

    #[test]
    fn from_parts_rejects_wrong_size() {
        let result = DerivedKey::from_parts(CipherAlgorithm::Rabbit, &[0u8; 32], [0u8; 32]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeySize {
                expected: 16,
                actual: 32
            })
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let key = DerivedKey::from_parts(CipherAlgorithm::Rabbit, &[0x42; 16], [0x42; 32]).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("66"));
    }
}
