//! Property-based test generators using proptest.

use proptest::prelude::*;
use sealstore_crypto::{CipherAlgorithm, MIN_PASSPHRASE_LEN};

/// Strategy over every cipher algorithm.
pub fn algorithm_strategy() -> impl Strategy<Value = CipherAlgorithm> {
    prop::sample::select(CipherAlgorithm::ALL.to_vec())
}

/// Strategy for two distinct algorithms.
pub fn algorithm_pair_strategy() -> impl Strategy<Value = (CipherAlgorithm, CipherAlgorithm)> {
    (algorithm_strategy(), algorithm_strategy()).prop_filter("algorithms must differ", |(a, b)| a != b)
}

/// Strategy for record keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_./-]{1,32}").expect("Invalid regex")
}

/// Strategy for values, including the empty value.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for passphrases the key derivation accepts.
pub fn passphrase_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(&format!("[a-zA-Z0-9 !@#$%^&*]{{{MIN_PASSPHRASE_LEN},40}}"))
        .expect("Invalid regex")
        .prop_filter("passphrase must not be blank", |s| !s.trim().is_empty())
}

/// A mutation against a read-write context.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Put a value.
    Put {
        /// Record key.
        key: String,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Record key.
        key: String,
    },
    /// Clear the store.
    Clear,
}

/// Strategy for one operation over a small key space, so keys collide.
pub fn operation_strategy() -> impl Strategy<Value = StoreOperation> {
    let key = prop::sample::select(vec!["alpha", "beta", "gamma", "delta"]).prop_map(String::from);
    prop_oneof![
        5 => (key.clone(), value_strategy()).prop_map(|(key, value)| StoreOperation::Put { key, value }),
        2 => key.prop_map(|key| StoreOperation::Delete { key }),
        1 => Just(StoreOperation::Clear),
    ]
}

/// Strategy for a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
