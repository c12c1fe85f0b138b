//! Behavioural checks every encrypted provider must pass.
//!
//! Each check builds its own fixture, so they can be run per algorithm in
//! any order. [`run_all`] runs the full set.

use crate::fixtures::{encrypted_with, TestStore, OTHER_PASSPHRASE, TEST_PASSPHRASE};
use sealstore_core::EncryptedProvider;
use sealstore_crypto::CipherAlgorithm;
use sealstore_storage::{
    AccessMode, MemoryProvider, MemoryStore, ReadContext, StorageError, StorageProvider,
    WriteContext,
};
use std::collections::BTreeMap;

/// Tracks what an encrypted store should contain and checks it.
pub struct ContractHarness {
    /// Store under test.
    pub test: TestStore,
    expected: BTreeMap<String, Vec<u8>>,
}

impl ContractHarness {
    /// Opens a fresh harness for `algorithm`.
    pub async fn new(algorithm: CipherAlgorithm) -> Self {
        Self {
            test: TestStore::opened(algorithm).await,
            expected: BTreeMap::new(),
        }
    }

    /// Puts a value and tracks it.
    pub async fn put(&mut self, key: &str, value: &[u8]) {
        self.test
            .read_write_context()
            .expect("Failed to create context")
            .put(key, value)
            .await
            .expect("Failed to put value");
        self.expected.insert(key.to_string(), value.to_vec());
    }

    /// Deletes a key and tracks it.
    pub async fn delete(&mut self, key: &str) {
        self.test
            .read_write_context()
            .expect("Failed to create context")
            .delete(key)
            .await
            .expect("Failed to delete value");
        self.expected.remove(key);
    }

    /// Clears the store and tracks it.
    pub async fn clear(&mut self) {
        self.test
            .read_write_context()
            .expect("Failed to create context")
            .clear()
            .await
            .expect("Failed to clear store");
        self.expected.clear();
    }

    /// Verifies every tracked value decrypts, and that the backend holds
    /// exactly the tracked keys and no plaintext.
    pub async fn verify_all(&self) {
        let ctx = self
            .test
            .read_only_context()
            .expect("Failed to create context");
        for (key, expected) in &self.expected {
            let actual = ctx.get(key).await.expect("Failed to get value");
            assert_eq!(actual.as_ref(), Some(expected), "Value mismatch for {key:?}");
        }

        let raw = self.test.store.raw_entries();
        assert_eq!(
            raw.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            self.expected.keys().collect::<Vec<_>>(),
            "Backend keys diverged"
        );
        for (key, stored) in &raw {
            let plain = &self.expected[key];
            assert_ne!(stored, plain, "Backend holds plaintext for {key:?}");
        }
    }

    /// Returns the number of tracked keys.
    pub fn tracked_count(&self) -> usize {
        self.expected.len()
    }
}

/// The provider reports itself supported for `algorithm`.
pub fn check_supported(algorithm: CipherAlgorithm) {
    assert!(
        EncryptedProvider::<MemoryProvider>::is_supported_with(algorithm),
        "{algorithm} should be supported"
    );
    assert!(<EncryptedProvider<MemoryProvider> as StorageProvider>::is_supported());
}

/// `open` reports first access once per backing store.
pub async fn check_first_access(algorithm: CipherAlgorithm) {
    let store = MemoryStore::new();
    let first = TestStore::over(store.clone(), algorithm);
    assert!(first.open().await.expect("Failed to open"), "First open must report first access");
    assert!(!first.open().await.expect("Failed to reopen"), "Repeated open must not report first access");

    let second = TestStore::over(store, algorithm);
    assert!(!second.open().await.expect("Failed to open"), "Existing store must not report first access");
}

/// Values written through a read-write context read back unchanged.
pub async fn check_put_get(algorithm: CipherAlgorithm) {
    let mut harness = ContractHarness::new(algorithm).await;
    harness.put("alpha", b"first value").await;
    harness.put("beta", &[0u8; 300]).await;
    harness.put("empty", b"").await;
    harness.put("alpha", b"overwritten").await;
    harness.verify_all().await;
    assert_eq!(harness.tracked_count(), 3);

    let ctx = harness.test.read_only_context().expect("Failed to create context");
    assert_eq!(ctx.get("missing").await.expect("Failed to get"), None);
}

/// Deleted keys disappear and others survive.
pub async fn check_delete(algorithm: CipherAlgorithm) {
    let mut harness = ContractHarness::new(algorithm).await;
    harness.put("keep", b"kept").await;
    harness.put("drop", b"dropped").await;
    harness.delete("drop").await;
    harness.delete("never-existed").await;
    harness.verify_all().await;
}

/// Clearing removes everything.
pub async fn check_clear(algorithm: CipherAlgorithm) {
    let mut harness = ContractHarness::new(algorithm).await;
    harness.put("a", b"1").await;
    harness.put("b", b"2").await;
    harness.clear().await;
    harness.verify_all().await;
    assert!(harness.test.store.is_empty());
}

/// A read-only context refuses writes and leaves the store untouched.
pub async fn check_read_only_rejects_writes(algorithm: CipherAlgorithm) {
    let mut harness = ContractHarness::new(algorithm).await;
    harness.put("existing", b"value").await;
    let before = harness.test.store.raw_entries();

    let ctx = harness.test.context(AccessMode::ReadOnly).expect("Failed to create context");
    assert!(matches!(ctx.put("new", b"x").await, Err(StorageError::WriteNotPermitted)));
    assert!(matches!(ctx.delete("existing").await, Err(StorageError::WriteNotPermitted)));
    assert!(matches!(ctx.clear().await, Err(StorageError::WriteNotPermitted)));

    assert_eq!(harness.test.store.raw_entries(), before, "Read-only context changed the store");
    harness.verify_all().await;
}

/// Data written under `algorithm` cannot be read under any other algorithm.
pub async fn check_cross_algorithm_fails(algorithm: CipherAlgorithm) {
    let writer = TestStore::opened(algorithm).await;
    writer
        .read_write_context()
        .expect("Failed to create context")
        .put("secret", b"classified")
        .await
        .expect("Failed to put");

    for other in CipherAlgorithm::ALL.into_iter().filter(|a| *a != algorithm) {
        let reader = TestStore::over(writer.store.clone(), other);
        reader.open().await.expect("Failed to open");
        let result = reader
            .read_only_context()
            .expect("Failed to create context")
            .get("secret")
            .await;
        assert!(
            matches!(result, Err(StorageError::DecryptionFailed { ref key, .. }) if key == "secret"),
            "{other} read data written by {algorithm}: {result:?}"
        );
    }
}

/// Data written under one passphrase cannot be read under another.
pub async fn check_wrong_passphrase_fails(algorithm: CipherAlgorithm) {
    let writer = TestStore::opened(algorithm).await;
    writer
        .read_write_context()
        .expect("Failed to create context")
        .put("secret", b"classified")
        .await
        .expect("Failed to put");

    let reader = encrypted_with(
        OTHER_PASSPHRASE,
        MemoryProvider::with_store(writer.store.clone()),
        algorithm,
    );
    reader.open().await.expect("Failed to open");
    let result = reader
        .read_only_context()
        .expect("Failed to create context")
        .get("secret")
        .await;
    assert!(
        matches!(result, Err(StorageError::DecryptionFailed { .. })),
        "Wrong passphrase read data: {result:?}"
    );

    let same = encrypted_with(
        TEST_PASSPHRASE,
        MemoryProvider::with_store(writer.store.clone()),
        algorithm,
    );
    same.open().await.expect("Failed to open");
    assert_eq!(
        same.read_only_context()
            .expect("Failed to create context")
            .get("secret")
            .await
            .expect("Failed to get"),
        Some(b"classified".to_vec())
    );
}

/// Runs every check for `algorithm`.
pub async fn run_all(algorithm: CipherAlgorithm) {
    check_supported(algorithm);
    check_first_access(algorithm).await;
    check_put_get(algorithm).await;
    check_delete(algorithm).await;
    check_clear(algorithm).await;
    check_read_only_rejects_writes(algorithm).await;
    check_cross_algorithm_fails(algorithm).await;
    check_wrong_passphrase_fails(algorithm).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rabbit_passes_contract() {
        run_all(CipherAlgorithm::Rabbit).await;
    }
}
