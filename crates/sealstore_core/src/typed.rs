//! CBOR-encoded typed values on top of byte contexts.

use async_trait::async_trait;
use sealstore_storage::{ReadContext, StorageError, StorageResult, WriteContext};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Typed reads for any [`ReadContext`].
#[async_trait]
pub trait TypedRead: ReadContext {
    /// Fetches and decodes the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Codec`] if the stored bytes are not a valid
    /// CBOR encoding of `T`, plus anything `get` can return.
    async fn get_value<T>(&self, key: &str) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => ciborium::de::from_reader(bytes.as_slice())
                .map(Some)
                .map_err(|e| StorageError::codec(format!("decoding {key:?}: {e}"))),
            None => Ok(None),
        }
    }
}

impl<C: ReadContext + ?Sized> TypedRead for C {}

/// Typed writes for any [`WriteContext`].
#[async_trait]
pub trait TypedWrite: WriteContext {
    /// Encodes `value` as CBOR and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Codec`] if `value` cannot be encoded, plus
    /// anything `put` can return.
    async fn put_value<T>(&self, key: &str, value: &T) -> StorageResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes)
            .map_err(|e| StorageError::codec(format!("encoding {key:?}: {e}")))?;
        self.put(key, &bytes).await
    }
}

impl<C: WriteContext + ?Sized> TypedWrite for C {}
