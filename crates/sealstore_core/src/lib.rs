//! # sealstore core
//!
//! An encrypting decorator for any [`StorageProvider`].
//!
//! [`EncryptedProvider`] wraps a backend, derives key material from a
//! passphrase, and seals every value with the configured
//! [`CipherAlgorithm`] before it reaches the backend. It implements the
//! same provider contract as the backend it wraps, so callers do not change
//! when encryption is added or the cipher is swapped.
//!
//! Guarantees:
//!
//! - the backend only ever receives envelopes, never plaintext values
//! - a value written under one cipher or passphrase never decrypts under
//!   another; the read fails with [`StorageError::DecryptionFailed`]
//! - read-only contexts cannot write, and never forward a write to the
//!   backend
//! - backend errors reach the caller unchanged
//!
//! ## Example
//!
//! ```rust
//! use sealstore_core::{EncryptedProvider, ProviderConfig, TypedRead, TypedWrite};
//! use sealstore_crypto::KdfParams;
//! use sealstore_storage::{MemoryProvider, StorageProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), sealstore_storage::StorageError> {
//! let config = ProviderConfig::new().kdf(KdfParams::low_cost());
//! let provider = EncryptedProvider::with_config("hunter2 hunter2", MemoryProvider::new(), config)?;
//!
//! let first_access = provider.open().await?;
//! assert!(first_access);
//!
//! let ctx = provider.read_write_context()?;
//! ctx.put_value("answer", &42u32).await?;
//! assert_eq!(ctx.get_value::<u32>("answer").await?, Some(42));
//! # Ok(())
//! # }
//! ```
//!
//! [`CipherAlgorithm`]: sealstore_crypto::CipherAlgorithm
//! [`StorageError::DecryptionFailed`]: sealstore_storage::StorageError::DecryptionFailed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod provider;
mod typed;

pub use config::{
    ProviderConfig, CIPHER_ENV, KDF_ITERATIONS_ENV, KDF_MEMORY_ENV, KDF_PARALLELISM_ENV,
};
pub use context::{EncryptedReadContext, EncryptedWriteContext};
pub use provider::EncryptedProvider;
pub use typed::{TypedRead, TypedWrite};

pub use sealstore_crypto::{CipherAlgorithm, KdfParams};
pub use sealstore_storage::{
    AccessMode, Context, ProviderState, ReadContext, StorageError, StorageProvider,
    StorageResult, WriteContext,
};
