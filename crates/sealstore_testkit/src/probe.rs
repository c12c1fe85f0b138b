//! An instrumented provider for observing and breaking a backend.
//!
//! [`ProbeProvider`] forwards to an inner provider while recording every
//! call that reaches it, so tests can assert on exactly what a decorator
//! sent to its backend. It can also inject failures.

use async_trait::async_trait;
use parking_lot::Mutex;
use sealstore_storage::{
    ReadContext, StorageError, StorageProvider, StorageResult, WriteContext,
};
use std::sync::Arc;

/// A call observed by a [`ProbeProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `open`
    Open,
    /// `close`
    Close,
    /// `read_only_context`
    ReadOnlyContext,
    /// `read_write_context`
    ReadWriteContext,
    /// `get(key)`
    Get(String),
    /// `put(key, bytes)`
    Put(String, Vec<u8>),
    /// `delete(key)`
    Delete(String),
    /// `clear`
    Clear,
}

impl Call {
    /// Returns true for `put`, `delete` and `clear`.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Put(..) | Self::Delete(_) | Self::Clear)
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Vec<Call>,
    fail_next_open: Option<String>,
    fail_operations: Option<String>,
}

/// Shared view of a probe's recordings and fault switches.
///
/// Take one with [`ProbeProvider::handle`] before handing the provider to a
/// decorator.
#[derive(Debug, Clone, Default)]
pub struct ProbeHandle {
    state: Arc<Mutex<ProbeState>>,
}

impl ProbeHandle {
    /// Every call seen so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Number of `open` calls.
    pub fn open_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Open))
    }

    /// Number of calls that would have changed the store.
    pub fn mutation_count(&self) -> usize {
        self.count(Call::is_mutation)
    }

    /// Every byte string passed to `put`, in order.
    pub fn put_payloads(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Put(_, bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Makes the next `open` fail with [`StorageError::Backend`].
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.state.lock().fail_next_open = Some(message.into());
    }

    /// Makes every get/put/delete/clear fail until [`heal`](Self::heal).
    pub fn fail_operations(&self, message: impl Into<String>) {
        self.state.lock().fail_operations = Some(message.into());
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.fail_next_open = None;
        state.fail_operations = None;
    }

    /// Forgets recorded calls.
    pub fn reset(&self) {
        self.state.lock().calls.clear();
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn record_op(&self, call: Call) -> StorageResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match &state.fail_operations {
            Some(message) => Err(StorageError::backend(message.clone())),
            None => Ok(()),
        }
    }
}

/// Forwards to `B`, recording calls and injecting failures.
#[derive(Debug)]
pub struct ProbeProvider<B> {
    inner: B,
    handle: ProbeHandle,
}

impl<B: StorageProvider> ProbeProvider<B> {
    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            handle: ProbeHandle::default(),
        }
    }

    /// Returns a handle sharing this probe's state.
    pub fn handle(&self) -> ProbeHandle {
        self.handle.clone()
    }

    /// Returns the wrapped provider.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: StorageProvider> StorageProvider for ProbeProvider<B> {
    type ReadOnly<'a> = ProbeReadContext<'a, B> where Self: 'a;
    type ReadWrite<'a> = ProbeWriteContext<'a, B> where Self: 'a;

    fn is_supported() -> bool {
        B::is_supported()
    }

    fn name(&self) -> &str {
        "probe"
    }

    async fn open(&self) -> StorageResult<bool> {
        let injected = {
            let mut state = self.handle.state.lock();
            state.calls.push(Call::Open);
            state.fail_next_open.take()
        };
        if let Some(message) = injected {
            return Err(StorageError::backend(message));
        }
        self.inner.open().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.handle.record(Call::Close);
        self.inner.close().await
    }

    fn read_only_context(&self) -> StorageResult<ProbeReadContext<'_, B>> {
        self.handle.record(Call::ReadOnlyContext);
        Ok(ProbeReadContext {
            handle: &self.handle,
            inner: self.inner.read_only_context()?,
        })
    }

    fn read_write_context(&self) -> StorageResult<ProbeWriteContext<'_, B>> {
        self.handle.record(Call::ReadWriteContext);
        Ok(ProbeWriteContext {
            handle: &self.handle,
            inner: self.inner.read_write_context()?,
        })
    }
}

/// Read-only context of a [`ProbeProvider`].
pub struct ProbeReadContext<'a, B: StorageProvider + 'a> {
    handle: &'a ProbeHandle,
    inner: B::ReadOnly<'a>,
}

/// Read-write context of a [`ProbeProvider`].
pub struct ProbeWriteContext<'a, B: StorageProvider + 'a> {
    handle: &'a ProbeHandle,
    inner: B::ReadWrite<'a>,
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> ReadContext for ProbeReadContext<'a, B> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.handle.record_op(Call::Get(key.to_string()))?;
        self.inner.get(key).await
    }
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> ReadContext for ProbeWriteContext<'a, B> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.handle.record_op(Call::Get(key.to_string()))?;
        self.inner.get(key).await
    }
}

#[async_trait]
impl<'a, B: StorageProvider + 'a> WriteContext for ProbeWriteContext<'a, B> {
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.handle
            .record_op(Call::Put(key.to_string(), value.to_vec()))?;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.handle.record_op(Call::Delete(key.to_string()))?;
        self.inner.delete(key).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.handle.record_op(Call::Clear)?;
        self.inner.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealstore_storage::MemoryProvider;

    #[tokio::test]
    async fn records_calls_in_order() {
        let probe = ProbeProvider::new(MemoryProvider::new());
        let handle = probe.handle();

        probe.open().await.unwrap();
        let ctx = probe.read_write_context().unwrap();
        ctx.put("k", b"v").await.unwrap();
        ctx.get("k").await.unwrap();
        ctx.delete("k").await.unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                Call::Open,
                Call::ReadWriteContext,
                Call::Put("k".into(), b"v".to_vec()),
                Call::Get("k".into()),
                Call::Delete("k".into()),
            ]
        );
        assert_eq!(handle.mutation_count(), 2);
    }

    #[tokio::test]
    async fn injected_open_failure_is_one_shot() {
        let probe = ProbeProvider::new(MemoryProvider::new());
        let handle = probe.handle();
        handle.fail_next_open("disk on fire");

        assert!(matches!(probe.open().await, Err(StorageError::Backend(_))));
        assert!(probe.open().await.unwrap());
        assert_eq!(handle.open_count(), 2);
    }

    #[tokio::test]
    async fn injected_operation_failure_until_healed() {
        let probe = ProbeProvider::new(MemoryProvider::new());
        let handle = probe.handle();
        probe.open().await.unwrap();
        let ctx = probe.read_write_context().unwrap();

        handle.fail_operations("quota exceeded");
        assert!(ctx.put("k", b"v").await.is_err());
        assert!(probe.inner().is_empty());

        handle.heal();
        assert!(ctx.put("k", b"v").await.is_ok());
    }
}
