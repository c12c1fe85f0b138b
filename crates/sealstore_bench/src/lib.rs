//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use sealstore_core::{EncryptedProvider, ProviderConfig};
use sealstore_crypto::{CipherAlgorithm, KdfParams};
use sealstore_storage::StorageProvider;

/// Passphrase used by every benchmark.
pub const BENCH_PASSPHRASE: &str = "benchmark passphrase";

/// Payload sizes exercised by the throughput benchmarks.
pub const PAYLOAD_SIZES: [usize; 4] = [64, 256, 1024, 16 * 1024];

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Wraps `backend` using cheap key derivation, so setup does not dominate.
pub fn encrypted<B: StorageProvider>(backend: B, algorithm: CipherAlgorithm) -> EncryptedProvider<B> {
    let config = ProviderConfig::new()
        .algorithm(algorithm)
        .kdf(KdfParams::low_cost());
    EncryptedProvider::with_config(BENCH_PASSPHRASE, backend, config)
        .expect("Failed to construct encrypted provider")
}

/// A single-threaded runtime for driving async providers from criterion.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime")
}
