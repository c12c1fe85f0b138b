//! Provider and context traits.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission mode of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    /// `get` only.
    ReadOnly,
    /// `get`, `put`, `delete` and `clear`.
    ReadWrite,
}

impl AccessMode {
    /// Returns true if the mode allows mutation.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("read-only"),
            Self::ReadWrite => f.write_str("read-write"),
        }
    }
}

/// Lifecycle of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderState {
    /// Constructed, not yet opened.
    Unopened,
    /// An `open` call is in flight.
    Opening,
    /// Ready for contexts.
    Opened,
    /// Closed; no further operations are accepted.
    Closed,
}

impl ProviderState {
    /// Returns the error for an operation attempted outside `Opened`.
    ///
    /// Returns `None` when the state is `Opened`.
    #[must_use]
    pub fn require_open(self) -> Option<StorageError> {
        match self {
            Self::Opened => None,
            Self::Closed => Some(StorageError::Closed),
            Self::Unopened | Self::Opening => Some(StorageError::NotOpen),
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Opening => "opening",
            Self::Opened => "opened",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Read access to a key-value store.
///
/// An absent key is `Ok(None)`, never an error.
#[async_trait]
pub trait ReadContext: Send + Sync {
    /// Fetches the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not open or the backing store
    /// fails.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
}

/// Read and write access to a key-value store.
///
/// Each call is its own unit; no atomicity is implied across calls.
#[async_trait]
pub trait WriteContext: ReadContext {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not open or the backing store
    /// fails.
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not open or the backing store
    /// fails.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Removes every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not open or the backing store
    /// fails.
    async fn clear(&self) -> StorageResult<()>;
}

/// An asynchronous key-value store with permission-scoped contexts.
///
/// # Invariants
///
/// - `open` resolves `Ok(true)` only for the first open of the underlying
///   store
/// - contexts borrow the provider and cannot outlive it
/// - read-only context types do not implement [`WriteContext`]
///
/// # Implementors
///
/// - [`super::MemoryProvider`] - in-process map
/// - [`super::FileProvider`] - durable single-file log
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Context returned by [`read_only_context`](Self::read_only_context).
    type ReadOnly<'a>: ReadContext
    where
        Self: 'a;

    /// Context returned by [`read_write_context`](Self::read_write_context).
    type ReadWrite<'a>: WriteContext
    where
        Self: 'a;

    /// Whether this provider type can run in the current environment.
    fn is_supported() -> bool
    where
        Self: Sized;

    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Opens the underlying store.
    ///
    /// Resolves to `true` if this is the first time the store was ever
    /// opened.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    async fn open(&self) -> StorageResult<bool>;

    /// Closes the store. Later operations fail with [`StorageError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Returns a context that can only read.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] before `open` completes and
    /// [`StorageError::Closed`] after `close`.
    fn read_only_context(&self) -> StorageResult<Self::ReadOnly<'_>>;

    /// Returns a context that can read and write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] before `open` completes and
    /// [`StorageError::Closed`] after `close`.
    fn read_write_context(&self) -> StorageResult<Self::ReadWrite<'_>>;

    /// Returns a context for a mode chosen at runtime.
    ///
    /// # Errors
    ///
    /// Same as the mode-specific constructors.
    fn context(&self, mode: AccessMode) -> StorageResult<Context<'_, Self>>
    where
        Self: Sized,
    {
        Ok(match mode {
            AccessMode::ReadOnly => Context::ReadOnly(self.read_only_context()?),
            AccessMode::ReadWrite => Context::ReadWrite(self.read_write_context()?),
        })
    }
}

/// A context whose mode is chosen at runtime.
///
/// Mutations on the `ReadOnly` arm fail with
/// [`StorageError::WriteNotPermitted`] without reaching the provider.
pub enum Context<'a, P: StorageProvider + 'a> {
    /// Read-only handle.
    ReadOnly(P::ReadOnly<'a>),
    /// Read-write handle.
    ReadWrite(P::ReadWrite<'a>),
}

impl<'a, P: StorageProvider + 'a> Context<'a, P> {
    /// Returns the permission mode.
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        match self {
            Self::ReadOnly(_) => AccessMode::ReadOnly,
            Self::ReadWrite(_) => AccessMode::ReadWrite,
        }
    }

    /// See [`ReadContext::get`].
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self {
            Self::ReadOnly(ctx) => ctx.get(key).await,
            Self::ReadWrite(ctx) => ctx.get(key).await,
        }
    }

    /// See [`WriteContext::put`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteNotPermitted`] on a read-only context.
    pub async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.writer()?.put(key, value).await
    }

    /// See [`WriteContext::delete`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteNotPermitted`] on a read-only context.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.writer()?.delete(key).await
    }

    /// See [`WriteContext::clear`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteNotPermitted`] on a read-only context.
    pub async fn clear(&self) -> StorageResult<()> {
        self.writer()?.clear().await
    }

    fn writer(&self) -> StorageResult<&P::ReadWrite<'a>> {
        match self {
            Self::ReadOnly(_) => Err(StorageError::WriteNotPermitted),
            Self::ReadWrite(ctx) => Ok(ctx),
        }
    }
}

impl<'a, P: StorageProvider + 'a> fmt::Debug for Context<'a, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("mode", &self.mode()).finish()
    }
}
