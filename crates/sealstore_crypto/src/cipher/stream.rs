//! Rabbit stream cipher keystream.

use crate::error::{CryptoError, CryptoResult};
use rabbit::cipher::{KeyIvInit, StreamCipher};
use rabbit::Rabbit;

/// XORs `data` with the Rabbit keystream for `key`/`iv`.
///
/// Encryption and decryption are the same operation.
pub(super) fn apply_keystream(key: &[u8], iv: &[u8], data: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut cipher = Rabbit::new_from_slices(key, iv)
        .map_err(|_| CryptoError::encryption_failed("invalid key or IV length"))?;
    let mut buffer = data.to_vec();
    cipher.apply_keystream(&mut buffer);
    Ok(buffer)
}
