//! The encrypting provider.

use crate::config::ProviderConfig;
use crate::context::{EncryptedReadContext, EncryptedWriteContext};
use crate::error;
use async_trait::async_trait;
use parking_lot::RwLock;
use sealstore_crypto::{derive_key, CipherAlgorithm, DerivedKey, KdfParams};
use sealstore_storage::{ProviderState, StorageError, StorageProvider, StorageResult};
use std::fmt;
use tracing::{debug, warn};

/// Encrypts every value before it reaches `B` and decrypts it on the way
/// back.
///
/// The wrapper implements [`StorageProvider`] itself, so it can stand in for
/// any backend. Key material is derived from the passphrase once, at
/// construction; the passphrase is not kept.
///
/// Values are sealed with the record key as associated data, so an
/// envelope copied to a different key does not decrypt.
///
/// # Lifecycle
///
/// `Unopened -> Opening -> Opened -> Closed`. A failed `open` returns to
/// `Unopened` and may be retried. Contexts can only be created while
/// `Opened`; after `close` every operation fails with
/// [`StorageError::Closed`].
///
/// # Example
///
/// ```rust
/// use sealstore_core::{EncryptedProvider, ProviderConfig};
/// use sealstore_crypto::{CipherAlgorithm, KdfParams};
/// use sealstore_storage::{MemoryProvider, ReadContext, StorageProvider, WriteContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let config = ProviderConfig::new()
///     .algorithm(CipherAlgorithm::Rabbit)
///     .kdf(KdfParams::low_cost());
/// let provider =
///     EncryptedProvider::with_config("correct horse battery", MemoryProvider::new(), config)
///         .unwrap();
///
/// provider.open().await.unwrap();
/// let ctx = provider.read_write_context().unwrap();
/// ctx.put("key", b"value").await.unwrap();
/// assert_eq!(ctx.get("key").await.unwrap(), Some(b"value".to_vec()));
/// # }
/// ```
pub struct EncryptedProvider<B> {
    backend: B,
    algorithm: CipherAlgorithm,
    key: DerivedKey,
    state: RwLock<ProviderState>,
    name: String,
}

impl<B: StorageProvider> EncryptedProvider<B> {
    /// Wraps `backend` with AES-256-CBC and default key derivation cost.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPassphrase`] if the passphrase is
    /// rejected.
    pub fn new(passphrase: &str, backend: B) -> StorageResult<Self> {
        Self::with_config(passphrase, backend, ProviderConfig::default())
    }

    /// Wraps `backend` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPassphrase`] if the passphrase is
    /// rejected, or [`StorageError::UnsupportedEnvironment`] if the cipher
    /// or key derivation parameters cannot be used.
    pub fn with_config(passphrase: &str, backend: B, config: ProviderConfig) -> StorageResult<Self> {
        let algorithm = config.algorithm;
        if !algorithm.is_supported() {
            return Err(StorageError::unsupported(format!(
                "cipher {algorithm} is not available"
            )));
        }

        let key = derive_key(passphrase, algorithm, &config.kdf).map_err(error::from_crypto)?;
        let name = format!("encrypted[{algorithm}]({})", backend.name());

        debug!(provider = %name, algorithm = %algorithm, "key derived");

        Ok(Self {
            backend,
            algorithm,
            key,
            state: RwLock::new(ProviderState::Unopened),
            name,
        })
    }

    /// Wraps `backend` with AES-256-CBC.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn aes(passphrase: &str, backend: B) -> StorageResult<Self> {
        Self::with_algorithm(passphrase, backend, CipherAlgorithm::Aes256Cbc)
    }

    /// Wraps `backend` with Triple DES in CBC mode.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn triple_des(passphrase: &str, backend: B) -> StorageResult<Self> {
        Self::with_algorithm(passphrase, backend, CipherAlgorithm::TripleDesCbc)
    }

    /// Wraps `backend` with the Rabbit stream cipher.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn rabbit(passphrase: &str, backend: B) -> StorageResult<Self> {
        Self::with_algorithm(passphrase, backend, CipherAlgorithm::Rabbit)
    }

    /// Wraps `backend` with AES-256-GCM.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn aes_gcm(passphrase: &str, backend: B) -> StorageResult<Self> {
        Self::with_algorithm(passphrase, backend, CipherAlgorithm::Aes256Gcm)
    }

    fn with_algorithm(passphrase: &str, backend: B, algorithm: CipherAlgorithm) -> StorageResult<Self> {
        let config = ProviderConfig::new()
            .algorithm(algorithm)
            .kdf(KdfParams::default());
        Self::with_config(passphrase, backend, config)
    }

    /// Whether `algorithm` and the backend type both work here.
    ///
    /// Callable before any provider is constructed.
    #[must_use]
    pub fn is_supported_with(algorithm: CipherAlgorithm) -> bool {
        algorithm.is_supported() && B::is_supported()
    }

    /// Returns the cipher in use.
    #[must_use]
    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProviderState {
        *self.state.read()
    }

    /// Returns the wrapped backend.
    ///
    /// Anything written through it bypasses encryption.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unwraps the backend.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub(crate) fn ensure_open(&self) -> StorageResult<()> {
        match self.state().require_open() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn seal(&self, key: &str, plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        self.algorithm
            .seal(&self.key, plaintext, key.as_bytes())
            .map_err(error::from_crypto)
    }

    pub(crate) fn unseal(&self, key: &str, stored: &[u8]) -> StorageResult<Vec<u8>> {
        self.algorithm
            .open(&self.key, stored, key.as_bytes())
            .map_err(|err| {
                warn!(
                    provider = %self.name,
                    algorithm = %self.algorithm,
                    key,
                    "stored value failed to decrypt"
                );
                error::decryption(key, err)
            })
    }
}

/// Returns the state to `Unopened` if an `open` future is dropped before the
/// backend answers.
struct OpeningGuard<'a> {
    state: &'a RwLock<ProviderState>,
    armed: bool,
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.write();
            if *state == ProviderState::Opening {
                *state = ProviderState::Unopened;
            }
        }
    }
}

#[async_trait]
impl<B: StorageProvider> StorageProvider for EncryptedProvider<B> {
    type ReadOnly<'a> = EncryptedReadContext<'a, B> where Self: 'a;
    type ReadWrite<'a> = EncryptedWriteContext<'a, B> where Self: 'a;

    fn is_supported() -> bool {
        Self::is_supported_with(CipherAlgorithm::default())
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> StorageResult<bool> {
        {
            let mut state = self.state.write();
            match *state {
                ProviderState::Opened => {
                    debug!(provider = %self.name, "already open");
                    return Ok(false);
                }
                ProviderState::Opening => return Err(StorageError::NotOpen),
                ProviderState::Closed => return Err(StorageError::Closed),
                ProviderState::Unopened => *state = ProviderState::Opening,
            }
        }

        let mut guard = OpeningGuard {
            state: &self.state,
            armed: true,
        };
        let result = self.backend.open().await;
        guard.armed = false;

        let mut state = self.state.write();
        if *state == ProviderState::Closed {
            return Err(StorageError::Closed);
        }
        match result {
            Ok(first_access) => {
                *state = ProviderState::Opened;
                debug!(
                    provider = %self.name,
                    algorithm = %self.algorithm,
                    first_access,
                    "opened"
                );
                Ok(first_access)
            }
            Err(err) => {
                *state = ProviderState::Unopened;
                debug!(provider = %self.name, error = %err, "backend open failed");
                Err(err)
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        let previous = std::mem::replace(&mut *self.state.write(), ProviderState::Closed);
        if previous == ProviderState::Closed {
            return Ok(());
        }
        debug!(provider = %self.name, "closed");
        self.backend.close().await
    }

    fn read_only_context(&self) -> StorageResult<EncryptedReadContext<'_, B>> {
        self.ensure_open()?;
        let inner = self.backend.read_only_context()?;
        debug!(provider = %self.name, mode = "read-only", "context created");
        Ok(EncryptedReadContext::new(self, inner))
    }

    fn read_write_context(&self) -> StorageResult<EncryptedWriteContext<'_, B>> {
        self.ensure_open()?;
        let inner = self.backend.read_write_context()?;
        debug!(provider = %self.name, mode = "read-write", "context created");
        Ok(EncryptedWriteContext::new(self, inner))
    }
}

impl<B> fmt::Debug for EncryptedProvider<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedProvider")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("state", &*self.state.read())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealstore_storage::{MemoryProvider, ReadContext, WriteContext};

    const PASSPHRASE: &str = "correct horse battery staple";

    fn provider(algorithm: CipherAlgorithm) -> EncryptedProvider<MemoryProvider> {
        let config = ProviderConfig::new()
            .algorithm(algorithm)
            .kdf(KdfParams::low_cost());
        EncryptedProvider::with_config(PASSPHRASE, MemoryProvider::new(), config).unwrap()
    }

    #[test]
    fn starts_unopened() {
        let p = provider(CipherAlgorithm::Aes256Cbc);
        assert_eq!(p.state(), ProviderState::Unopened);
        assert!(matches!(p.read_only_context(), Err(StorageError::NotOpen)));
        assert!(matches!(p.read_write_context(), Err(StorageError::NotOpen)));
    }

    #[tokio::test]
    async fn open_transitions_and_reports_first_access() {
        let p = provider(CipherAlgorithm::Rabbit);
        assert!(p.open().await.unwrap());
        assert_eq!(p.state(), ProviderState::Opened);
        // Already open: the backend is not asked again
        assert!(!p.open().await.unwrap());
    }

    #[tokio::test]
    async fn close_is_terminal() {
        let p = provider(CipherAlgorithm::Aes256Gcm);
        p.open().await.unwrap();
        let ctx = p.read_write_context().unwrap();
        ctx.put("k", b"v").await.unwrap();

        p.close().await.unwrap();
        assert_eq!(p.state(), ProviderState::Closed);
        assert!(matches!(ctx.get("k").await, Err(StorageError::Closed)));
        assert!(matches!(p.read_only_context(), Err(StorageError::Closed)));
        assert!(matches!(p.open().await, Err(StorageError::Closed)));
        assert!(p.close().await.is_ok());
    }

    #[test]
    fn invalid_passphrase_rejected_at_construction() {
        let result = EncryptedProvider::with_config(
            "",
            MemoryProvider::new(),
            ProviderConfig::new().kdf(KdfParams::low_cost()),
        );
        assert!(matches!(result, Err(StorageError::InvalidPassphrase(_))));
    }

    #[test]
    fn support_probe_needs_no_instance() {
        assert!(<EncryptedProvider<MemoryProvider> as StorageProvider>::is_supported());
        for algorithm in CipherAlgorithm::ALL {
            assert!(EncryptedProvider::<MemoryProvider>::is_supported_with(algorithm));
        }
    }

    #[test]
    fn name_describes_stack() {
        let p = provider(CipherAlgorithm::TripleDesCbc);
        assert_eq!(p.name(), "encrypted[3des-cbc](memory)");
    }

    #[test]
    fn debug_hides_key_material() {
        let debug = format!("{:?}", provider(CipherAlgorithm::Aes256Cbc));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(PASSPHRASE));
    }

    #[tokio::test]
    async fn backend_never_sees_plaintext() {
        let p = provider(CipherAlgorithm::Aes256Cbc);
        p.open().await.unwrap();
        p.read_write_context()
            .unwrap()
            .put("secret", b"plaintext value")
            .await
            .unwrap();

        let stored = p.backend().store().raw_get("secret").unwrap();
        assert!(!stored
            .windows(b"plaintext value".len())
            .any(|w| w == b"plaintext value"));
    }
}
