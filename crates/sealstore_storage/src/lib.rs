//! # sealstore storage
//!
//! The asynchronous key-value provider contract and its reference backends.
//!
//! Providers are **opaque byte stores**: they never interpret the values
//! they hold. The encrypting decorator in `sealstore_core` implements the
//! same [`StorageProvider`] trait, so call sites do not change when a store
//! is wrapped.
//!
//! ## Contexts
//!
//! All reads and writes go through a context borrowed from an open provider:
//!
//! - [`ReadContext`] - `get` only
//! - [`WriteContext`] - `get`, `put`, `delete`, `clear`
//!
//! Read-only context types do not implement [`WriteContext`], so writing
//! through one does not compile. [`Context`] covers callers that pick the
//! mode at runtime; its read-only arm rejects writes with
//! [`StorageError::WriteNotPermitted`].
//!
//! ## Available Backends
//!
//! - [`MemoryProvider`] - for tests and ephemeral data
//! - [`FileProvider`] - durable single-file record log

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
pub mod log;
mod memory;
mod provider;

pub use error::{ErrorKind, StorageError, StorageResult};
pub use file::{FileConfig, FileProvider, FileReadContext, FileWriteContext};
pub use memory::{MemoryProvider, MemoryReadContext, MemoryStore, MemoryWriteContext};
pub use provider::{
    AccessMode, Context, ProviderState, ReadContext, StorageProvider, WriteContext,
};
