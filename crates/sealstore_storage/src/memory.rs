//! In-memory provider for testing and ephemeral stores.

use crate::error::{StorageError, StorageResult};
use crate::provider::{ProviderState, ReadContext, StorageProvider, WriteContext};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct StoreInner {
    entries: BTreeMap<String, Vec<u8>>,
    opened_before: bool,
}

/// Shared map behind one or more [`MemoryProvider`]s.
///
/// Cloning the handle shares the data, so several providers (for example
/// with different ciphers) can be pointed at the same store, and a store
/// can be "reopened" by a fresh provider.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored entry, in key order.
    ///
    /// Useful for asserting on exactly what a provider wrote.
    #[must_use]
    pub fn raw_entries(&self) -> Vec<(String, Vec<u8>)> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the stored bytes for `key`.
    #[must_use]
    pub fn raw_get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Overwrites the stored bytes for `key`, bypassing any provider.
    ///
    /// Used to simulate tampering or foreign data.
    pub fn raw_put(&self, key: &str, value: Vec<u8>) {
        self.inner.write().entries.insert(key.to_string(), value);
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Returns true once any provider has opened this store.
    #[must_use]
    pub fn was_opened(&self) -> bool {
        self.inner.read().opened_before
    }
}

/// A provider backed by a [`MemoryStore`].
///
/// # Example
///
/// ```rust
/// use sealstore_storage::{MemoryProvider, ReadContext, StorageProvider, WriteContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MemoryProvider::new();
/// assert!(provider.open().await.unwrap());
///
/// let ctx = provider.read_write_context().unwrap();
/// ctx.put("greeting", b"hello").await.unwrap();
/// assert_eq!(ctx.get("greeting").await.unwrap(), Some(b"hello".to_vec()));
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryProvider {
    store: MemoryStore,
    state: RwLock<ProviderState>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl MemoryProvider {
    /// Creates a provider over a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider over an existing store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            state: RwLock::new(ProviderState::Unopened),
        }
    }

    /// Returns the shared store handle.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProviderState {
        *self.state.read()
    }

    /// Shorthand for [`MemoryStore::raw_entries`].
    #[must_use]
    pub fn raw_entries(&self) -> Vec<(String, Vec<u8>)> {
        self.store.raw_entries()
    }

    /// Shorthand for [`MemoryStore::len`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Shorthand for [`MemoryStore::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        match self.state().require_open() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    type ReadOnly<'a> = MemoryReadContext<'a>;
    type ReadWrite<'a> = MemoryWriteContext<'a>;

    fn is_supported() -> bool {
        true
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn open(&self) -> StorageResult<bool> {
        let mut state = self.state.write();
        if *state == ProviderState::Closed {
            return Err(StorageError::Closed);
        }

        let first_access = {
            let mut inner = self.store.inner.write();
            let first = !inner.opened_before;
            inner.opened_before = true;
            first
        };
        *state = ProviderState::Opened;

        debug!(provider = "memory", first_access, "opened");
        Ok(first_access)
    }

    async fn close(&self) -> StorageResult<()> {
        *self.state.write() = ProviderState::Closed;
        debug!(provider = "memory", "closed");
        Ok(())
    }

    fn read_only_context(&self) -> StorageResult<MemoryReadContext<'_>> {
        self.ensure_open()?;
        Ok(MemoryReadContext { provider: self })
    }

    fn read_write_context(&self) -> StorageResult<MemoryWriteContext<'_>> {
        self.ensure_open()?;
        Ok(MemoryWriteContext { provider: self })
    }
}

/// Read-only context over a [`MemoryProvider`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryReadContext<'a> {
    provider: &'a MemoryProvider,
}

/// Read-write context over a [`MemoryProvider`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryWriteContext<'a> {
    provider: &'a MemoryProvider,
}

fn get(provider: &MemoryProvider, key: &str) -> StorageResult<Option<Vec<u8>>> {
    provider.ensure_open()?;
    Ok(provider.store.raw_get(key))
}

#[async_trait]
impl ReadContext for MemoryReadContext<'_> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        get(self.provider, key)
    }
}

#[async_trait]
impl ReadContext for MemoryWriteContext<'_> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        get(self.provider, key)
    }
}

#[async_trait]
impl WriteContext for MemoryWriteContext<'_> {
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.provider.ensure_open()?;
        self.provider.store.raw_put(key, value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.provider.ensure_open()?;
        self.provider.store.inner.write().entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.provider.ensure_open()?;
        self.provider.store.inner.write().entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AccessMode;

    #[tokio::test]
    async fn first_open_reports_first_access() {
        let store = MemoryStore::new();
        let p1 = MemoryProvider::with_store(store.clone());
        assert!(p1.open().await.unwrap());

        let p2 = MemoryProvider::with_store(store);
        assert!(!p2.open().await.unwrap());
    }

    #[tokio::test]
    async fn put_get_delete_clear() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();
        let ctx = provider.read_write_context().unwrap();

        ctx.put("a", b"1").await.unwrap();
        ctx.put("b", b"2").await.unwrap();
        assert_eq!(ctx.get("a").await.unwrap(), Some(b"1".to_vec()));

        ctx.delete("a").await.unwrap();
        assert_eq!(ctx.get("a").await.unwrap(), None);
        assert_eq!(provider.len(), 1);

        ctx.clear().await.unwrap();
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();
        let ctx = provider.read_only_context().unwrap();
        assert_eq!(ctx.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_key_succeeds() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();
        let ctx = provider.read_write_context().unwrap();
        assert!(ctx.delete("nope").await.is_ok());
    }

    #[test]
    fn context_before_open_fails() {
        let provider = MemoryProvider::new();
        assert!(matches!(
            provider.read_only_context(),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(
            provider.read_write_context(),
            Err(StorageError::NotOpen)
        ));
    }

    #[tokio::test]
    async fn operations_after_close_fail() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();
        let ctx = provider.read_write_context().unwrap();
        provider.close().await.unwrap();

        assert!(matches!(ctx.get("a").await, Err(StorageError::Closed)));
        assert!(matches!(ctx.put("a", b"1").await, Err(StorageError::Closed)));
        assert!(matches!(provider.open().await, Err(StorageError::Closed)));
        assert_eq!(provider.state(), ProviderState::Closed);
    }

    #[tokio::test]
    async fn runtime_read_only_context_rejects_writes() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();

        let ctx = provider.context(AccessMode::ReadOnly).unwrap();
        assert_eq!(ctx.mode(), AccessMode::ReadOnly);
        assert!(matches!(
            ctx.put("k", b"v").await,
            Err(StorageError::WriteNotPermitted)
        ));
        assert!(matches!(ctx.clear().await, Err(StorageError::WriteNotPermitted)));
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn raw_entries_are_sorted() {
        let provider = MemoryProvider::new();
        provider.open().await.unwrap();
        let ctx = provider.context(AccessMode::ReadWrite).unwrap();
        ctx.put("b", b"2").await.unwrap();
        ctx.put("a", b"1").await.unwrap();

        let keys: Vec<_> = provider.raw_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
