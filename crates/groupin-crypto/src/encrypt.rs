use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    Encrypt(aes_gcm::Error),

    #[error("decryption failed: {0}")]
    Decrypt(aes_gcm::Error),

    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("ciphertext too short ({0} bytes)")]
    Truncated(usize),

    #[error("plaintext is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encrypt a plaintext message with AES-256-GCM.
/// Returns (ciphertext, nonce). A fresh random nonce is drawn per call.
pub fn encrypt_message(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext).map_err(CipherError::Encrypt)?;

    Ok((ciphertext, nonce_bytes))
}

/// Decrypt a ciphertext message with AES-256-GCM.
pub fn decrypt_message(key: &[u8; 32], ciphertext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let nonce = Nonce::from_slice(nonce);

    cipher.decrypt(nonce, ciphertext).map_err(CipherError::Decrypt)
}

/// Encrypt a string into its text form: base64 of `nonce || ciphertext`.
/// The base64 alphabet never contains `#` or a newline.
pub fn seal(key: &[u8; 32], plaintext: &str) -> Result<String, CipherError> {
    let (ciphertext, nonce) = encrypt_message(key, plaintext.as_bytes())?;

    let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(packed))
}

/// Reverse of [`seal`].
pub fn open(key: &[u8; 32], sealed: &str) -> Result<String, CipherError> {
    let packed = BASE64.decode(sealed)?;
    if packed.len() <= NONCE_LEN {
        return Err(CipherError::Truncated(packed.len()));
    }
    let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
    let nonce: &[u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| CipherError::Truncated(packed.len()))?;

    let plaintext = decrypt_message(key, ciphertext, nonce)?;
    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_shared_key;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = generate_shared_key();
        let message = b"Hello from GroupIn!";

        let (ciphertext, nonce) = encrypt_message(&key, message).unwrap();
        assert_ne!(&ciphertext, message);

        let decrypted = decrypt_message(&key, &ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn wrong_key_fails() {
        let key1 = generate_shared_key();
        let key2 = generate_shared_key();

        let sealed = seal(&key1, "Secret message").unwrap();
        assert!(matches!(open(&key2, &sealed), Err(CipherError::Decrypt(_))));
    }

    #[test]
    fn sealed_text_has_no_framing_characters() {
        let key = generate_shared_key();
        for body in ["", "a", "with #hash\nand newline", "ünïcödé"] {
            let sealed = seal(&key, body).unwrap();
            assert!(!sealed.contains('#'));
            assert!(!sealed.contains('\n'));
            assert_eq!(open(&key, &sealed).unwrap(), body);
        }
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let key = generate_shared_key();
        assert_ne!(seal(&key, "same").unwrap(), seal(&key, "same").unwrap());
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let key = generate_shared_key();
        assert!(matches!(open(&key, "not base64!"), Err(CipherError::Encoding(_))));
        assert!(matches!(open(&key, "AAAA"), Err(CipherError::Truncated(3))));
    }
}
