//! # sealstore crypto
//!
//! Key derivation, cipher strategies and the on-backend envelope format
//! used by the sealstore encrypting provider.
//!
//! This crate performs no I/O. Every operation is a pure, synchronous
//! transformation over byte slices.
//!
//! ## Cipher Strategies
//!
//! The set of algorithms is closed and selected by [`CipherAlgorithm`]:
//!
//! - [`CipherAlgorithm::Aes256Cbc`] - AES-256 in CBC mode, PKCS#7, HMAC-SHA256
//! - [`CipherAlgorithm::TripleDesCbc`] - 3DES (EDE3) in CBC mode, PKCS#7, HMAC-SHA256
//! - [`CipherAlgorithm::Rabbit`] - Rabbit stream cipher, HMAC-SHA256
//! - [`CipherAlgorithm::Aes256Gcm`] - AES-256-GCM (AEAD)
//!
//! All variants fail closed: a wrong key, a different algorithm, a
//! truncated or tampered envelope yields [`CryptoError::DecryptionFailed`].
//!
//! ## Example
//!
//! ```rust
//! use sealstore_crypto::{derive_key, CipherAlgorithm, KdfParams};
//!
//! let algorithm = CipherAlgorithm::Rabbit;
//! let key = derive_key("correct horse battery", algorithm, &KdfParams::low_cost()).unwrap();
//!
//! let envelope = algorithm.encrypt(&key, b"hello", b"greeting").unwrap();
//! let plaintext = algorithm.decrypt(&key, &envelope, b"greeting").unwrap();
//! assert_eq!(plaintext, b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod algorithm;
mod cipher;
mod envelope;
mod error;
mod kdf;
mod key;

pub use algorithm::CipherAlgorithm;
pub use envelope::{Envelope, ENVELOPE_VERSION, HEADER_SIZE, MAC_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_key, validate_passphrase, KdfParams, MIN_PASSPHRASE_LEN};
pub use key::{DerivedKey, MAC_KEY_SIZE};
