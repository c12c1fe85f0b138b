//! On-backend envelope format.
//!
//! ## Layout
//!
//! ```text
//! version (1) | algorithm tag (1) | iv (algorithm iv_len) | ciphertext | mac (32, non-AEAD only)
//! ```
//!
//! The header is authenticated together with the ciphertext, so flipping
//! the algorithm tag or version invalidates the envelope.

use crate::algorithm::CipherAlgorithm;
use crate::error::{CryptoError, CryptoResult};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Size of the envelope header in bytes (version + algorithm tag).
pub const HEADER_SIZE: usize = 2;

/// Size of the HMAC-SHA256 tag appended by non-AEAD algorithms.
pub const MAC_SIZE: usize = 32;

/// Encrypted value plus the metadata needed to decrypt it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Algorithm that sealed this envelope.
    pub algorithm: CipherAlgorithm,
    /// The IV or nonce (unique per encryption).
    pub iv: Vec<u8>,
    /// The ciphertext (for GCM this includes the auth tag).
    pub ciphertext: Vec<u8>,
    /// Detached HMAC tag; empty for AEAD algorithms.
    pub mac: Vec<u8>,
}

impl Envelope {
    /// Returns the header bytes for this envelope.
    #[must_use]
    pub fn header(&self) -> [u8; HEADER_SIZE] {
        [ENVELOPE_VERSION, self.algorithm.tag()]
    }

    /// Returns the total encoded size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.iv.len() + self.ciphertext.len() + self.mac.len()
    }

    /// Returns true if the ciphertext is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes the envelope for storage.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.header());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes.extend_from_slice(&self.mac);
        bytes
    }

    /// Decodes an envelope.
    ///
    /// Only the framing is checked here; authenticity is verified by
    /// [`CipherAlgorithm::decrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if the bytes are truncated,
    /// carry an unknown version or algorithm tag.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let algorithm = Self::peek_algorithm(bytes)?;

        let iv_len = algorithm.iv_len();
        let mac_len = algorithm.mac_len();
        let min_len = HEADER_SIZE + iv_len + algorithm.min_ciphertext_len() + mac_len;
        if bytes.len() < min_len {
            return Err(CryptoError::decryption_failed(format!(
                "envelope too short: {} bytes, need at least {min_len}",
                bytes.len()
            )));
        }

        let body = &bytes[HEADER_SIZE..];
        let (iv, rest) = body.split_at(iv_len);
        let (ciphertext, mac) = rest.split_at(rest.len() - mac_len);

        Ok(Self {
            algorithm,
            iv: iv.to_vec(),
            ciphertext: ciphertext.to_vec(),
            mac: mac.to_vec(),
        })
    }

    /// Reads the algorithm from an encoded envelope without decrypting it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if the header is missing or
    /// not recognised.
    pub fn peek_algorithm(bytes: &[u8]) -> CryptoResult<CipherAlgorithm> {
        if bytes.len() < HEADER_SIZE {
            return Err(CryptoError::decryption_failed("envelope too short"));
        }
        if bytes[0] != ENVELOPE_VERSION {
            return Err(CryptoError::decryption_failed(format!(
                "unsupported envelope version {}",
                bytes[0]
            )));
        }
        CipherAlgorithm::from_tag(bytes[1]).ok_or_else(|| {
            CryptoError::decryption_failed(format!("unknown algorithm tag {:#04x}", bytes[1]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(algorithm: CipherAlgorithm) -> Envelope {
        Envelope {
            algorithm,
            iv: vec![7; algorithm.iv_len()],
            ciphertext: vec![9; 32],
            mac: vec![1; algorithm.mac_len()],
        }
    }

    #[test]
    fn bytes_roundtrip() {
        for algorithm in CipherAlgorithm::ALL {
            let envelope = sample(algorithm);
            let bytes = envelope.to_bytes();
            assert_eq!(bytes.len(), envelope.len());
            assert_eq!(Envelope::from_bytes(&bytes).unwrap(), envelope);
        }
    }

    #[test]
    fn header_layout() {
        let bytes = sample(CipherAlgorithm::Rabbit).to_bytes();
        assert_eq!(bytes[0], ENVELOPE_VERSION);
        assert_eq!(bytes[1], CipherAlgorithm::Rabbit.tag());
    }

    #[test]
    fn peek_reads_algorithm() {
        let bytes = sample(CipherAlgorithm::TripleDesCbc).to_bytes();
        assert_eq!(
            Envelope::peek_algorithm(&bytes).unwrap(),
            CipherAlgorithm::TripleDesCbc
        );
    }

    #[test]
    fn empty_input_fails() {
        assert!(Envelope::from_bytes(&[]).unwrap_err().is_decryption_failure());
        assert!(Envelope::from_bytes(&[ENVELOPE_VERSION])
            .unwrap_err()
            .is_decryption_failure());
    }

    #[test]
    fn unknown_version_fails() {
        let mut bytes = sample(CipherAlgorithm::Aes256Cbc).to_bytes();
        bytes[0] = 99;
        assert!(Envelope::from_bytes(&bytes).unwrap_err().is_decryption_failure());
    }

    #[test]
    fn unknown_tag_fails() {
        let mut bytes = sample(CipherAlgorithm::Aes256Cbc).to_bytes();
        bytes[1] = 0xEE;
        assert!(Envelope::from_bytes(&bytes).unwrap_err().is_decryption_failure());
    }

    #[test]
    fn truncated_envelope_fails() {
        let bytes = sample(CipherAlgorithm::Aes256Cbc).to_bytes();
        let cut = HEADER_SIZE + 16 + 8;
        assert!(Envelope::from_bytes(&bytes[..cut])
            .unwrap_err()
            .is_decryption_failure());
    }

    #[test]
    fn plaintext_is_not_an_envelope() {
        assert!(Envelope::from_bytes(b"value").is_err());
    }
}
