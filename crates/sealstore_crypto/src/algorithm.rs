//! The closed set of cipher strategies.

use crate::cipher;
use crate::envelope::Envelope;
use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A symmetric cipher strategy.
///
/// Every variant satisfies the same contract: `decrypt(encrypt(p, k), k) == p`
/// for a key derived for that variant, and decryption fails with
/// [`CryptoError::DecryptionFailed`] on any mismatch instead of returning
/// wrong plaintext.
///
/// The discriminant is the tag byte written into every [`Envelope`] header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipherAlgorithm {
    /// AES-256 block cipher in CBC mode with PKCS#7 padding, encrypt-then-MAC.
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc = 1,
    /// Triple DES (EDE, three keys) in CBC mode with PKCS#7 padding, encrypt-then-MAC.
    #[serde(rename = "3des-cbc")]
    TripleDesCbc = 2,
    /// Rabbit stream cipher, encrypt-then-MAC.
    #[serde(rename = "rabbit")]
    Rabbit = 3,
    /// AES-256-GCM authenticated encryption.
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm = 4,
}

impl CipherAlgorithm {
    /// Every supported algorithm, in tag order.
    pub const ALL: [CipherAlgorithm; 4] = [
        Self::Aes256Cbc,
        Self::TripleDesCbc,
        Self::Rabbit,
        Self::Aes256Gcm,
    ];

    /// Converts an envelope tag byte to an algorithm.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Aes256Cbc),
            2 => Some(Self::TripleDesCbc),
            3 => Some(Self::Rabbit),
            4 => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    /// Returns the envelope tag byte.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns the stable string identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Aes256Cbc => "aes-256-cbc",
            Self::TripleDesCbc => "3des-cbc",
            Self::Rabbit => "rabbit",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }

    /// Size of the cipher key in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes256Cbc | Self::Aes256Gcm => 32,
            Self::TripleDesCbc => 24,
            Self::Rabbit => 16,
        }
    }

    /// Size of the IV (or nonce) stored in each envelope.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        match self {
            Self::Aes256Cbc => 16,
            Self::TripleDesCbc | Self::Rabbit => 8,
            Self::Aes256Gcm => 12,
        }
    }

    /// Size of the detached authentication tag at the end of an envelope.
    ///
    /// Zero for GCM, whose tag is part of the ciphertext.
    #[must_use]
    pub const fn mac_len(self) -> usize {
        match self {
            Self::Aes256Gcm => 0,
            _ => crate::envelope::MAC_SIZE,
        }
    }

    /// Minimum ciphertext length for a well-formed envelope.
    #[must_use]
    pub const fn min_ciphertext_len(self) -> usize {
        match self {
            // PKCS#7 always emits at least one full block
            Self::Aes256Cbc => 16,
            Self::TripleDesCbc => 8,
            Self::Rabbit => 0,
            Self::Aes256Gcm => 16,
        }
    }

    /// Whether this algorithm can be used in the current build.
    ///
    /// All variants are pure-Rust implementations, so this only returns
    /// false if the algorithm fails its round-trip self test.
    #[must_use]
    pub fn is_supported(self) -> bool {
        cipher::self_test(self)
    }

    /// Encrypts `plaintext` into a fresh envelope.
    ///
    /// `aad` is authenticated but not encrypted; the same bytes must be
    /// supplied to [`decrypt`](Self::decrypt).
    ///
    /// # Errors
    ///
    /// Returns an error if `key` was derived for another algorithm.
    pub fn encrypt(self, key: &DerivedKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<Envelope> {
        cipher::encrypt(self, key, plaintext, aad)
    }

    /// Decrypts an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if the envelope was sealed by
    /// another algorithm or key, was tampered with, or `aad` differs.
    pub fn decrypt(self, key: &DerivedKey, envelope: &Envelope, aad: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::decrypt(self, key, envelope, aad)
    }

    /// Encrypts and serializes in one step.
    pub fn seal(self, key: &DerivedKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(self.encrypt(key, plaintext, aad)?.to_bytes())
    }

    /// Parses and decrypts in one step.
    pub fn open(self, key: &DerivedKey, bytes: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
        let envelope = Envelope::from_bytes(bytes)?;
        self.decrypt(key, &envelope, aad)
    }
}

impl Default for CipherAlgorithm {
    fn default() -> Self {
        Self::Aes256Cbc
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-cbc" | "aes256cbc" | "aes" => Ok(Self::Aes256Cbc),
            "3des-cbc" | "3des" | "tripledes" | "triple-des" => Ok(Self::TripleDesCbc),
            "rabbit" => Ok(Self::Rabbit),
            "aes-256-gcm" | "aes256gcm" | "aes-gcm" => Ok(Self::Aes256Gcm),
            _ => Err(CryptoError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        for algorithm in CipherAlgorithm::ALL {
            assert_eq!(CipherAlgorithm::from_tag(algorithm.tag()), Some(algorithm));
        }
        assert_eq!(CipherAlgorithm::from_tag(0), None);
        assert_eq!(CipherAlgorithm::from_tag(5), None);
    }

    #[test]
    fn parse_ids_and_aliases() {
        for algorithm in CipherAlgorithm::ALL {
            assert_eq!(algorithm.id().parse::<CipherAlgorithm>().unwrap(), algorithm);
        }
        assert_eq!("AES".parse::<CipherAlgorithm>().unwrap(), CipherAlgorithm::Aes256Cbc);
        assert_eq!(
            "TripleDES".parse::<CipherAlgorithm>().unwrap(),
            CipherAlgorithm::TripleDesCbc
        );
        assert!(matches!(
            "blowfish".parse::<CipherAlgorithm>(),
            Err(CryptoError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn serde_uses_ids() {
        let json = serde_json::to_string(&CipherAlgorithm::TripleDesCbc).unwrap();
        assert_eq!(json, "\"3des-cbc\"");
        let parsed: CipherAlgorithm = serde_json::from_str("\"aes-256-gcm\"").unwrap();
        assert_eq!(parsed, CipherAlgorithm::Aes256Gcm);
    }

    #[test]
    fn every_algorithm_is_supported() {
        for algorithm in CipherAlgorithm::ALL {
            assert!(algorithm.is_supported(), "{algorithm} should be supported");
        }
    }

    #[test]
    fn default_is_aes_cbc() {
        assert_eq!(CipherAlgorithm::default(), CipherAlgorithm::Aes256Cbc);
    }
}
