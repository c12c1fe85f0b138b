//! CLI command implementations.

pub mod algorithms;
pub mod compact;
pub mod inspect;
pub mod kv;
pub mod verify;

use sealstore_core::{EncryptedProvider, ProviderConfig};
use sealstore_storage::{FileProvider, StorageProvider};
use std::path::Path;
use tracing::debug;

/// An encrypted store over a log file.
pub type Store = EncryptedProvider<FileProvider>;

/// Derives the key and opens the encrypted store at `path`, creating it if
/// needed.
pub async fn open(
    path: &Path,
    passphrase: &str,
    config: ProviderConfig,
) -> Result<Store, Box<dyn std::error::Error>> {
    let store = EncryptedProvider::with_config(passphrase, FileProvider::new(path), config)?;
    let first_access = store.open().await?;
    debug!(path = %path.display(), first_access, "store opened");
    Ok(store)
}

/// Closes a store opened with [`open`].
pub async fn close(store: Store) -> Result<(), Box<dyn std::error::Error>> {
    store.close().await?;
    Ok(())
}

/// Opens the raw log at `path` without a key. The file must already exist.
pub(crate) async fn open_raw(path: &Path) -> Result<FileProvider, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }
    let provider = FileProvider::new(path);
    provider.open().await?;
    Ok(provider)
}
