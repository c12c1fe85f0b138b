//! Encrypted stores over the append-only file backend.

use proptest::prelude::*;
use sealstore_core::{StorageError, TypedRead, TypedWrite};
use sealstore_storage::{ReadContext, StorageProvider, WriteContext};
use sealstore_testkit::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Account {
    owner: String,
    balance: i64,
}

#[tokio::test]
async fn reopen_reads_back_every_algorithm() {
    for algorithm in CipherAlgorithm::ALL {
        let test = TestFileStore::new(algorithm);
        assert!(test.open().await.unwrap());
        let ctx = test.read_write_context().unwrap();
        ctx.put_value("acct", &Account { owner: "ada".into(), balance: 42 })
            .await
            .unwrap();
        ctx.put("gone", b"x").await.unwrap();
        ctx.delete("gone").await.unwrap();
        drop(ctx);

        let test = test.reopen(TEST_PASSPHRASE, algorithm).await;
        assert!(!test.open().await.unwrap());
        let ctx = test.read_only_context().unwrap();
        assert_eq!(
            ctx.get_value::<Account>("acct").await.unwrap(),
            Some(Account { owner: "ada".into(), balance: 42 })
        );
        assert_eq!(ctx.get("gone").await.unwrap(), None);
    }
}

#[tokio::test]
async fn log_file_holds_no_plaintext() {
    let test = TestFileStore::new(CipherAlgorithm::Aes256Cbc);
    test.open().await.unwrap();
    test.read_write_context()
        .unwrap()
        .put("diary", b"dear diary, today I learned rust")
        .await
        .unwrap();

    let raw = std::fs::read(test.path()).unwrap();
    let needle = b"dear diary";
    assert!(!raw.windows(needle.len()).any(|w| w == needle));
}

#[tokio::test]
async fn reopen_with_wrong_passphrase_fails_to_decrypt() {
    let test = TestFileStore::new(CipherAlgorithm::Rabbit);
    test.open().await.unwrap();
    test.read_write_context()
        .unwrap()
        .put("pin", b"1234")
        .await
        .unwrap();

    let test = test.reopen(OTHER_PASSPHRASE, CipherAlgorithm::Rabbit).await;
    test.open().await.unwrap();
    assert!(matches!(
        test.read_only_context().unwrap().get("pin").await,
        Err(StorageError::DecryptionFailed { .. })
    ));
}

#[tokio::test]
async fn reopen_with_other_algorithm_fails_to_decrypt() {
    let test = TestFileStore::new(CipherAlgorithm::Aes256Gcm);
    test.open().await.unwrap();
    test.read_write_context()
        .unwrap()
        .put("pin", b"1234")
        .await
        .unwrap();

    let test = test.reopen(TEST_PASSPHRASE, CipherAlgorithm::TripleDesCbc).await;
    test.open().await.unwrap();
    assert!(matches!(
        test.read_only_context().unwrap().get("pin").await,
        Err(StorageError::DecryptionFailed { .. })
    ));
}

#[tokio::test]
async fn compacted_log_still_decrypts() {
    let test = TestFileStore::new(CipherAlgorithm::Aes256Gcm);
    test.open().await.unwrap();
    let ctx = test.read_write_context().unwrap();
    for i in 0..20 {
        ctx.put("counter", i.to_string().as_bytes()).await.unwrap();
    }
    drop(ctx);

    let before = test.backend().file_size().unwrap();
    test.backend().compact().unwrap();
    assert!(test.backend().file_size().unwrap() < before);
    assert_eq!(test.backend().entry_count().unwrap(), 1);

    let test = test.reopen(TEST_PASSPHRASE, CipherAlgorithm::Aes256Gcm).await;
    test.open().await.unwrap();
    assert_eq!(
        test.read_only_context().unwrap().get("counter").await.unwrap(),
        Some(b"19".to_vec())
    );
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn operation_sequences_match_model(
        algorithm in algorithm_strategy(),
        ops in operation_sequence_strategy(1, 24),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let test = TestStore::opened(algorithm).await;
            let ctx = test.read_write_context().unwrap();
            let mut model = std::collections::BTreeMap::new();

            for op in &ops {
                match op {
                    StoreOperation::Put { key, value } => {
                        ctx.put(key, value).await.unwrap();
                        model.insert(key.clone(), value.clone());
                    }
                    StoreOperation::Delete { key } => {
                        ctx.delete(key).await.unwrap();
                        model.remove(key);
                    }
                    StoreOperation::Clear => {
                        ctx.clear().await.unwrap();
                        model.clear();
                    }
                }
            }

            for key in ["alpha", "beta", "gamma", "delta"] {
                assert_eq!(ctx.get(key).await.unwrap(), model.get(key).cloned());
            }
            assert_eq!(test.store.len(), model.len());
        });
    }

    #[test]
    fn any_value_round_trips(
        algorithm in algorithm_strategy(),
        key in key_strategy(),
        value in value_strategy(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let read = runtime.block_on(async {
            let test = TestStore::opened(algorithm).await;
            let ctx = test.read_write_context().unwrap();
            ctx.put(&key, &value).await.unwrap();
            ctx.get(&key).await.unwrap()
        });
        prop_assert_eq!(read, Some(value));
    }
}
