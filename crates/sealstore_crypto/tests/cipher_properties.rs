//! Property tests for the cipher strategies.

use proptest::prelude::*;
use sealstore_crypto::{derive_key, CipherAlgorithm, DerivedKey, Envelope, KdfParams};

fn algorithm_strategy() -> impl Strategy<Value = CipherAlgorithm> {
    prop::sample::select(CipherAlgorithm::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    #[test]
    fn seal_then_open_returns_plaintext(
        algorithm in algorithm_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..512),
        aad in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let key = DerivedKey::generate(algorithm);
        let sealed = algorithm.seal(&key, &plaintext, &aad).unwrap();
        prop_assert_eq!(algorithm.open(&key, &sealed, &aad).unwrap(), plaintext);
    }

    #[test]
    fn other_key_never_opens(
        algorithm in algorithm_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let key = DerivedKey::generate(algorithm);
        let other = DerivedKey::generate(algorithm);
        let sealed = algorithm.seal(&key, &plaintext, b"k").unwrap();
        let err = algorithm.open(&other, &sealed, b"k").unwrap_err();
        prop_assert!(err.is_decryption_failure());
    }

    #[test]
    fn other_algorithm_never_opens(
        sealer in algorithm_strategy(),
        opener in algorithm_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        prop_assume!(sealer != opener);
        let sealed = sealer.seal(&DerivedKey::generate(sealer), &plaintext, b"").unwrap();
        let err = opener.open(&DerivedKey::generate(opener), &sealed, b"").unwrap_err();
        prop_assert!(err.is_decryption_failure());
    }

    #[test]
    fn any_flipped_byte_is_detected(
        algorithm in algorithm_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 1..128),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let key = DerivedKey::generate(algorithm);
        let mut sealed = algorithm.seal(&key, &plaintext, b"").unwrap();
        let i = position.index(sealed.len());
        sealed[i] ^= mask;
        prop_assert!(algorithm.open(&key, &sealed, b"").is_err());
    }

    #[test]
    fn arbitrary_bytes_are_rejected(
        algorithm in algorithm_strategy(),
        garbage in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let key = DerivedKey::generate(algorithm);
        let err = algorithm.open(&key, &garbage, b"").unwrap_err();
        prop_assert!(err.is_decryption_failure());
    }
}

#[test]
fn passphrase_keys_reopen_across_derivations() {
    let params = KdfParams::low_cost();
    for algorithm in CipherAlgorithm::ALL {
        let writer = derive_key("a reasonably long passphrase", algorithm, &params).unwrap();
        let sealed = algorithm.seal(&writer, b"persisted", b"settings").unwrap();

        // A second derivation stands in for a fresh process
        let reader = derive_key("a reasonably long passphrase", algorithm, &params).unwrap();
        assert_eq!(algorithm.open(&reader, &sealed, b"settings").unwrap(), b"persisted");

        let intruder = derive_key("some other passphrase", algorithm, &params).unwrap();
        assert!(algorithm.open(&intruder, &sealed, b"settings").is_err());
    }
}

#[test]
fn envelope_peek_matches_sealer() {
    for algorithm in CipherAlgorithm::ALL {
        let sealed = algorithm
            .seal(&DerivedKey::generate(algorithm), b"value", b"")
            .unwrap();
        assert_eq!(Envelope::peek_algorithm(&sealed).unwrap(), algorithm);
    }
}
