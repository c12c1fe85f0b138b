//! Algorithms command implementation.

use sealstore_core::EncryptedProvider;
use sealstore_crypto::CipherAlgorithm;
use sealstore_storage::FileProvider;

/// Runs the algorithms command.
pub fn run() {
    println!("{:<12} {:>4} {:>8}  {}", "ALGORITHM", "TAG", "KEY BITS", "STATUS");
    for (algorithm, supported) in listing() {
        println!(
            "{:<12} {:>4} {:>8}  {}",
            algorithm.id(),
            algorithm.tag(),
            algorithm.key_len() * 8,
            if supported { "available" } else { "unavailable" }
        );
    }
}

fn listing() -> Vec<(CipherAlgorithm, bool)> {
    CipherAlgorithm::ALL
        .into_iter()
        .map(|a| (a, EncryptedProvider::<FileProvider>::is_supported_with(a)))
        .collect()
}
