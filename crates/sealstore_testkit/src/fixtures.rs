//! Test fixtures and provider helpers.
//!
//! Every fixture uses [`KdfParams::low_cost`] so tests don't spend their
//! time in Argon2.

use sealstore_core::{EncryptedProvider, ProviderConfig};
use sealstore_crypto::{CipherAlgorithm, KdfParams};
use sealstore_storage::{FileProvider, MemoryProvider, MemoryStore, StorageProvider};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Passphrase used by default in fixtures.
pub const TEST_PASSPHRASE: &str = "correct horse battery staple";

/// A second valid passphrase, for wrong-key tests.
pub const OTHER_PASSPHRASE: &str = "tr0ub4dor&3 tr0ub4dor&3";

/// Provider configuration for tests.
#[must_use]
pub fn test_config(algorithm: CipherAlgorithm) -> ProviderConfig {
    ProviderConfig::new()
        .algorithm(algorithm)
        .kdf(KdfParams::low_cost())
}

/// Wraps `backend` with `algorithm` and the default test passphrase.
pub fn encrypted<B: StorageProvider>(backend: B, algorithm: CipherAlgorithm) -> EncryptedProvider<B> {
    encrypted_with(TEST_PASSPHRASE, backend, algorithm)
}

/// Wraps `backend` with `algorithm` and `passphrase`.
pub fn encrypted_with<B: StorageProvider>(
    passphrase: &str,
    backend: B,
    algorithm: CipherAlgorithm,
) -> EncryptedProvider<B> {
    EncryptedProvider::with_config(passphrase, backend, test_config(algorithm))
        .expect("Failed to construct encrypted provider")
}

/// An encrypted in-memory store whose raw contents can be inspected.
pub struct TestStore {
    /// The encrypted provider.
    pub provider: EncryptedProvider<MemoryProvider>,
    /// Handle onto what the backend holds.
    pub store: MemoryStore,
}

impl TestStore {
    /// Creates an unopened encrypted store over a new memory backend.
    pub fn memory(algorithm: CipherAlgorithm) -> Self {
        Self::over(MemoryStore::new(), algorithm)
    }

    /// Creates an unopened encrypted store over an existing memory backend.
    pub fn over(store: MemoryStore, algorithm: CipherAlgorithm) -> Self {
        let provider = encrypted(MemoryProvider::with_store(store.clone()), algorithm);
        Self { provider, store }
    }

    /// Creates and opens an encrypted store.
    pub async fn opened(algorithm: CipherAlgorithm) -> Self {
        let test = Self::memory(algorithm);
        test.provider.open().await.expect("Failed to open provider");
        test
    }
}

impl std::ops::Deref for TestStore {
    type Target = EncryptedProvider<MemoryProvider>;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

/// An encrypted file store in a temporary directory.
pub struct TestFileStore {
    /// The encrypted provider.
    pub provider: EncryptedProvider<FileProvider>,
    path: PathBuf,
    /// Kept alive to prevent cleanup.
    _temp_dir: TempDir,
}

impl TestFileStore {
    /// Creates an unopened encrypted file store.
    pub fn new(algorithm: CipherAlgorithm) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.slog");
        let provider = encrypted(FileProvider::new(&path), algorithm);
        Self {
            provider,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the current provider and constructs a fresh one over the same
    /// file, as a new process would.
    pub async fn reopen(self, passphrase: &str, algorithm: CipherAlgorithm) -> Self {
        self.provider.close().await.expect("Failed to close provider");
        let provider = encrypted_with(passphrase, FileProvider::new(&self.path), algorithm);
        Self { provider, ..self }
    }
}

impl std::ops::Deref for TestFileStore {
    type Target = EncryptedProvider<FileProvider>;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealstore_storage::{ReadContext, WriteContext};

    #[tokio::test]
    async fn memory_fixture_opens() {
        let test = TestStore::opened(CipherAlgorithm::Rabbit).await;
        test.read_write_context().unwrap().put("k", b"v").await.unwrap();
        assert_eq!(test.store.len(), 1);
    }

    #[tokio::test]
    async fn file_fixture_reopens() {
        let test = TestFileStore::new(CipherAlgorithm::Aes256Gcm);
        test.open().await.unwrap();
        test.read_write_context().unwrap().put("k", b"v").await.unwrap();

        let test = test.reopen(TEST_PASSPHRASE, CipherAlgorithm::Aes256Gcm).await;
        assert!(!test.open().await.unwrap());
        assert_eq!(
            test.read_only_context().unwrap().get("k").await.unwrap(),
            Some(b"v".to_vec())
        );
    }
}
