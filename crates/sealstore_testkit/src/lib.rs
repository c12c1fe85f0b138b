//! # sealstore testkit
//!
//! Test utilities for sealstore.
//!
//! This crate provides:
//! - Fixtures for encrypted memory and file stores
//! - A contract suite every cipher must pass
//! - An instrumented probe provider that records backend calls and injects
//!   failures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sealstore_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn gcm_contract() {
//!     run_all(CipherAlgorithm::Aes256Gcm).await;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod fixtures;
pub mod generators;
pub mod probe;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::probe::*;
    pub use sealstore_crypto::CipherAlgorithm;
}

pub use contract::*;
pub use fixtures::*;
pub use generators::*;
pub use probe::*;
