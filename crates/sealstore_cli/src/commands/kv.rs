//! Record read and write commands.

use super::Store;
use sealstore_storage::{ReadContext, StorageProvider, StorageResult, WriteContext};

/// Encrypts and stores `value` under `key`.
pub async fn put(store: &Store, key: &str, value: &[u8]) -> StorageResult<()> {
    store.read_write_context()?.put(key, value).await
}

/// Decrypts the value under `key`.
pub async fn get(store: &Store, key: &str) -> StorageResult<Option<Vec<u8>>> {
    store.read_only_context()?.get(key).await
}

/// Removes `key`.
pub async fn delete(store: &Store, key: &str) -> StorageResult<()> {
    store.read_write_context()?.delete(key).await
}

/// Removes every record.
pub async fn clear(store: &Store) -> StorageResult<()> {
    store.read_write_context()?.clear().await
}
