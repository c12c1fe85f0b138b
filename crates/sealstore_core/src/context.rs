//! Contexts handed out by [`EncryptedProvider`].

use crate::provider::EncryptedProvider;
use async_trait::async_trait;
use sealstore_storage::{ReadContext, StorageProvider, StorageResult, WriteContext};
use std::fmt;

/// Read-only view over an [`EncryptedProvider`].
///
/// Has no `put`, `delete` or `clear`; nothing it does can change the
/// backend.
pub struct EncryptedReadContext<'a, B: StorageProvider + 'a> {
    provider: &'a EncryptedProvider<B>,
    inner: B::ReadOnly<'a>,
}

/// Read-write view over an [`EncryptedProvider`].
pub struct EncryptedWriteContext<'a, B: StorageProvider + 'a> {
    provider: &'a EncryptedProvider<B>,
    inner: B::ReadWrite<'a>,
}

impl<'a, B: StorageProvider + 'a> EncryptedReadContext<'a, B> {
    pub(crate) fn new(provider: &'a EncryptedProvider<B>, inner: B::ReadOnly<'a>) -> Self {
        Self { provider, inner }
    }
}

impl<'a, B: StorageProvider + 'a> EncryptedWriteContext<'a, B> {
    pub(crate) fn new(provider: &'a EncryptedProvider<B>, inner: B::ReadWrite<'a>) -> Self {
        Self { provider, inner }
    }
}

async fn decrypting_get<B, C>(
    provider: &EncryptedProvider<B>,
    inner: &C,
    key: &str,
) -> StorageResult<Option<Vec<u8>>>
where
    B: StorageProvider,
    C: ReadContext + ?Sized,
{
    provider.ensure_open()?;
    match inner.get(key).await? {
        Some(stored) => provider.unseal(key, &stored).map(Some),
        None => Ok(None),
    }
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> ReadContext for EncryptedReadContext<'a, B> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        decrypting_get(self.provider, &self.inner, key).await
    }
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> ReadContext for EncryptedWriteContext<'a, B> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        decrypting_get(self.provider, &self.inner, key).await
    }
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> WriteContext for EncryptedWriteContext<'a, B> {
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.provider.ensure_open()?;
        let sealed = self.provider.seal(key, value)?;
        self.inner.put(key, &sealed).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.provider.ensure_open()?;
        self.inner.delete(key).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.provider.ensure_open()?;
        self.inner.clear().await
    }
}

impl<'a, B: StorageProvider + 'a> fmt::Debug for EncryptedReadContext<'a, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedReadContext")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl<'a, B: StorageProvider + 'a> fmt::Debug for EncryptedWriteContext<'a, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedWriteContext")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}
