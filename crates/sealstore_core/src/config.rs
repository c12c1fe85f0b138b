//! Provider configuration.

use sealstore_crypto::{CipherAlgorithm, KdfParams};
use sealstore_storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable selecting the cipher.
pub const CIPHER_ENV: &str = "SEALSTORE_CIPHER";
/// Environment variable overriding the Argon2 memory cost (KiB).
pub const KDF_MEMORY_ENV: &str = "SEALSTORE_KDF_MEMORY_KIB";
/// Environment variable overriding the Argon2 iteration count.
pub const KDF_ITERATIONS_ENV: &str = "SEALSTORE_KDF_ITERATIONS";
/// Environment variable overriding the Argon2 parallelism.
pub const KDF_PARALLELISM_ENV: &str = "SEALSTORE_KDF_PARALLELISM";

/// Configuration for an [`crate::EncryptedProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Cipher used for every value.
    pub algorithm: CipherAlgorithm,
    /// Key derivation cost.
    pub kdf: KdfParams,
}

impl ProviderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cipher.
    #[must_use]
    pub const fn algorithm(mut self, algorithm: CipherAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the key derivation parameters.
    #[must_use]
    pub const fn kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Builds a configuration from `SEALSTORE_*` environment variables.
    ///
    /// Unset or blank variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnsupportedEnvironment`] if a variable is set
    /// to a value that does not parse.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let algorithm = read(CIPHER_ENV)
            .map(|v| CipherAlgorithm::from_str(&v).map_err(crate::error::from_crypto))
            .transpose()?
            .unwrap_or(defaults.algorithm);

        let kdf = KdfParams {
            memory_cost: parse_u32(KDF_MEMORY_ENV, read(KDF_MEMORY_ENV))?
                .unwrap_or(defaults.kdf.memory_cost),
            time_cost: parse_u32(KDF_ITERATIONS_ENV, read(KDF_ITERATIONS_ENV))?
                .unwrap_or(defaults.kdf.time_cost),
            parallelism: parse_u32(KDF_PARALLELISM_ENV, read(KDF_PARALLELISM_ENV))?
                .unwrap_or(defaults.kdf.parallelism),
        };

        Ok(Self { algorithm, kdf })
    }
}

fn parse_u32(name: &str, value: Option<String>) -> StorageResult<Option<u32>> {
    value
        .map(|v| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| StorageError::unsupported(format!("{name}={v:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.algorithm, CipherAlgorithm::Aes256Cbc);
    }

    #[test]
    fn env_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (CIPHER_ENV, "rabbit"),
            (KDF_MEMORY_ENV, "512"),
            (KDF_ITERATIONS_ENV, "3"),
            (KDF_PARALLELISM_ENV, " 2 "),
        ]))
        .unwrap();
        assert_eq!(config.algorithm, CipherAlgorithm::Rabbit);
        assert_eq!(config.kdf, KdfParams::new().memory_cost(512).time_cost(3).parallelism(2));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = ProviderConfig::from_lookup(lookup(&[(CIPHER_ENV, "  ")])).unwrap();
        assert_eq!(config.algorithm, CipherAlgorithm::default());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            ProviderConfig::from_lookup(lookup(&[(CIPHER_ENV, "rot13")])),
            Err(StorageError::UnsupportedEnvironment(_))
        ));
        assert!(matches!(
            ProviderConfig::from_lookup(lookup(&[(KDF_ITERATIONS_ENV, "many")])),
            Err(StorageError::UnsupportedEnvironment(_))
        ));
    }

    #[test]
    fn builder_pattern() {
        let config = ProviderConfig::new()
            .algorithm(CipherAlgorithm::TripleDesCbc)
            .kdf(KdfParams::low_cost());
        assert_eq!(config.algorithm, CipherAlgorithm::TripleDesCbc);
        assert_eq!(config.kdf, KdfParams::low_cost());
    }
}
