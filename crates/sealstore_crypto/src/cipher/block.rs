//! CBC mode with PKCS#7 padding over any block cipher.

use crate::error::{CryptoError, CryptoResult};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};

pub(super) fn encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::encryption_failed("invalid key or IV length"))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

pub(super) fn decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let block_size = iv.len();
    if ciphertext.is_empty() || ciphertext.len() % block_size != 0 {
        return Err(CryptoError::decryption_failed(
            "ciphertext is not a whole number of blocks",
        ));
    }

    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::decryption_failed("invalid key or IV length"))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::decryption_failed("invalid padding"))
}
