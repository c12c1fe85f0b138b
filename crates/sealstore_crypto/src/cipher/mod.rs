//! Cipher strategy implementations.
//!
//! CBC and Rabbit variants are encrypt-then-MAC: the HMAC-SHA256 tag covers
//! the envelope header, IV, ciphertext and the caller's associated data,
//! and is verified before any decryption is attempted. GCM authenticates
//! the same inputs natively.

mod aead;
mod block;
mod stream;

use crate::algorithm::CipherAlgorithm;
use crate::envelope::Envelope;
use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn encrypt(
    algorithm: CipherAlgorithm,
    key: &DerivedKey,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Envelope> {
    if key.algorithm() != algorithm {
        return Err(CryptoError::encryption_failed(format!(
            "key derived for {} cannot be used with {algorithm}",
            key.algorithm()
        )));
    }

    let mut iv = vec![0u8; algorithm.iv_len()];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = match algorithm {
        CipherAlgorithm::Aes256Cbc => block::encrypt::<aes::Aes256>(key.cipher_key(), &iv, plaintext)?,
        CipherAlgorithm::TripleDesCbc => {
            block::encrypt::<des::TdesEde3>(key.cipher_key(), &iv, plaintext)?
        }
        CipherAlgorithm::Rabbit => stream::apply_keystream(key.cipher_key(), &iv, plaintext)?,
        CipherAlgorithm::Aes256Gcm => {
            let associated = associated_data(algorithm, aad);
            aead::encrypt(key.cipher_key(), &iv, plaintext, &associated)?
        }
    };

    let mut envelope = Envelope {
        algorithm,
        iv,
        ciphertext,
        mac: Vec::new(),
    };
    if algorithm.mac_len() > 0 {
        envelope.mac = compute_mac(key, &envelope, aad)?;
    }

    Ok(envelope)
}

pub(crate) fn decrypt(
    algorithm: CipherAlgorithm,
    key: &DerivedKey,
    envelope: &Envelope,
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if envelope.algorithm != algorithm {
        return Err(CryptoError::decryption_failed(format!(
            "envelope sealed with {}, expected {algorithm}",
            envelope.algorithm
        )));
    }
    if key.algorithm() != algorithm {
        return Err(CryptoError::decryption_failed(format!(
            "key derived for {} cannot open {algorithm} envelopes",
            key.algorithm()
        )));
    }
    if envelope.iv.len() != algorithm.iv_len() {
        return Err(CryptoError::decryption_failed("invalid IV length"));
    }

    match algorithm {
        CipherAlgorithm::Aes256Gcm => {
            let associated = associated_data(algorithm, aad);
            aead::decrypt(key.cipher_key(), &envelope.iv, &envelope.ciphertext, &associated)
        }
        CipherAlgorithm::Aes256Cbc => {
            verify_mac(key, envelope, aad)?;
            block::decrypt::<aes::Aes256>(key.cipher_key(), &envelope.iv, &envelope.ciphertext)
        }
        CipherAlgorithm::TripleDesCbc => {
            verify_mac(key, envelope, aad)?;
            block::decrypt::<des::TdesEde3>(key.cipher_key(), &envelope.iv, &envelope.ciphertext)
        }
        CipherAlgorithm::Rabbit => {
            verify_mac(key, envelope, aad)?;
            stream::apply_keystream(key.cipher_key(), &envelope.iv, &envelope.ciphertext)
                .map_err(|_| CryptoError::decryption_failed("rabbit keystream setup failed"))
        }
    }
}

/// Round-trips a fixed message to confirm the algorithm is usable.
pub(crate) fn self_test(algorithm: CipherAlgorithm) -> bool {
    const PROBE: &[u8] = b"sealstore self test";

    let key = DerivedKey::generate(algorithm);
    encrypt(algorithm, &key, PROBE, b"probe")
        .and_then(|envelope| decrypt(algorithm, &key, &envelope, b"probe"))
        .map(|plaintext| plaintext == PROBE)
        .unwrap_or(false)
}

fn associated_data(algorithm: CipherAlgorithm, aad: &[u8]) -> Vec<u8> {
    let mut associated = Vec::with_capacity(crate::envelope::HEADER_SIZE + aad.len());
    associated.extend_from_slice(&[crate::envelope::ENVELOPE_VERSION, algorithm.tag()]);
    associated.extend_from_slice(aad);
    associated
}

fn mac_for(key: &DerivedKey, envelope: &Envelope, aad: &[u8]) -> CryptoResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key.mac_key())
        .map_err(|_| CryptoError::invalid_key_size(key.mac_key().len(), crate::MAC_KEY_SIZE))?;
    mac.update(&envelope.header());
    mac.update(&envelope.iv);
    // Length prefixes keep the ciphertext/aad boundary unambiguous
    mac.update(&(envelope.ciphertext.len() as u64).to_le_bytes());
    mac.update(&envelope.ciphertext);
    mac.update(&(aad.len() as u64).to_le_bytes());
    mac.update(aad);
    Ok(mac)
}

fn compute_mac(key: &DerivedKey, envelope: &Envelope, aad: &[u8]) -> CryptoResult<Vec<u8>> {
    Ok(mac_for(key, envelope, aad)?.finalize().into_bytes().to_vec())
}

fn verify_mac(key: &DerivedKey, envelope: &Envelope, aad: &[u8]) -> CryptoResult<()> {
    mac_for(key, envelope, aad)?
        .verify_slice(&envelope.mac)
        .map_err(|_| CryptoError::decryption_failed("authentication failed (wrong key or tampered data)"))
}
