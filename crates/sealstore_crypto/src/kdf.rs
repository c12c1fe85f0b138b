//! Passphrase key derivation.
//!
//! Derivation is deterministic across processes: the same passphrase and
//! algorithm always yield the same key material, so a store written by one
//! provider instance can be reopened by another.
//!
//! 1. Argon2id stretches the passphrase into a 32-byte master secret, salted
//!    with a fixed per-algorithm label (`sealstore/v1/<algorithm-id>`).
//! 2. HKDF-SHA256 expands the master secret into a cipher key sized for the
//!    algorithm and an independent MAC key.

use crate::algorithm::CipherAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, MAC_KEY_SIZE};
use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Minimum passphrase length in characters.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Size of the intermediate Argon2id output.
const MASTER_KEY_SIZE: usize = 32;

/// Domain separation prefix for salts and HKDF labels.
const LABEL_PREFIX: &str = "sealstore/v1/";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendation for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Creates the default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap parameters for tests and benchmarks. Not for real passphrases.
    #[must_use]
    pub const fn low_cost() -> Self {
        Self {
            memory_cost: 256,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the number of iterations.
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the degree of parallelism.
    #[must_use]
    pub const fn parallelism(mut self, lanes: u32) -> Self {
        self.parallelism = lanes;
        self
    }
}

/// Checks a passphrase against the derivation requirements.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPassphrase`] if the passphrase is empty,
/// whitespace only, or shorter than [`MIN_PASSPHRASE_LEN`] characters.
pub fn validate_passphrase(passphrase: &str) -> CryptoResult<()> {
    if passphrase.is_empty() {
        return Err(CryptoError::invalid_passphrase("passphrase is empty"));
    }
    if passphrase.trim().is_empty() {
        return Err(CryptoError::invalid_passphrase("passphrase is only whitespace"));
    }
    let len = passphrase.chars().count();
    if len < MIN_PASSPHRASE_LEN {
        return Err(CryptoError::invalid_passphrase(format!(
            "passphrase must be at least {MIN_PASSPHRASE_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

/// Derives key material for `algorithm` from a passphrase.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPassphrase`] if the passphrase is rejected by
/// [`validate_passphrase`], or [`CryptoError::KeyDerivation`] if the
/// parameters are out of range for Argon2.
pub fn derive_key(
    passphrase: &str,
    algorithm: CipherAlgorithm,
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    validate_passphrase(passphrase)?;

    let label = format!("{LABEL_PREFIX}{}", algorithm.id());

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(MASTER_KEY_SIZE),
    )
    .map_err(|e| CryptoError::key_derivation(e.to_string()))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut master = Zeroizing::new([0u8; MASTER_KEY_SIZE]);
    argon2
        .hash_password_into(passphrase.as_bytes(), label.as_bytes(), master.as_mut())
        .map_err(|e| CryptoError::key_derivation(e.to_string()))?;

    let hk = Hkdf::<Sha256>::new(Some(label.as_bytes()), master.as_ref());

    let mut cipher_key = Zeroizing::new(vec![0u8; algorithm.key_len()]);
    hk.expand(format!("{label}/cipher").as_bytes(), &mut cipher_key)
        .map_err(|_| CryptoError::key_derivation("HKDF expand failed"))?;

    let mut mac_key = Zeroizing::new([0u8; MAC_KEY_SIZE]);
    hk.expand(format!("{label}/mac").as_bytes(), mac_key.as_mut())
        .map_err(|_| CryptoError::key_derivation("HKDF expand failed"))?;

    DerivedKey::from_parts(algorithm, &cipher_key, *mac_key)
}
