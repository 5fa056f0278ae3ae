use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;
use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};

/// Passphrase used when no key is configured. Every client built without
/// configuration shares it, so it protects nothing beyond casual reading.
pub const DEFAULT_PASSPHRASE: &str = "your_secret_key";

/// Where the shared key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Encoded,
    Passphrase,
    BuiltIn,
}

/// Generate a random 256-bit key for AES-256-GCM.
pub fn generate_shared_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

/// Encode a key to base64 for display/sharing.
pub fn key_to_base64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

/// Decode a base64 key.
pub fn key_from_base64(encoded: &str) -> Result<[u8; 32]> {
    let bytes = BASE64.decode(encoded.trim())?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow!("Invalid key length"))?;
    Ok(key)
}

/// Derive a key from a passphrase (SHA-256 of its UTF-8 bytes).
pub fn key_from_passphrase(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Pick the shared key: an explicit base64 key wins over a passphrase,
/// and the built-in passphrase is the last resort.
pub fn resolve_shared_key(
    encoded: Option<&str>,
    passphrase: Option<&str>,
) -> Result<([u8; 32], KeyOrigin)> {
    if let Some(encoded) = encoded.filter(|s| !s.trim().is_empty()) {
        return Ok((key_from_base64(encoded)?, KeyOrigin::Encoded));
    }
    if let Some(passphrase) = passphrase.filter(|s| !s.is_empty()) {
        return Ok((key_from_passphrase(passphrase), KeyOrigin::Passphrase));
    }
    Ok((key_from_passphrase(DEFAULT_PASSPHRASE), KeyOrigin::BuiltIn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_roundtrip() {
        let key = generate_shared_key();
        let encoded = key_to_base64(&key);
        assert_eq!(key_from_base64(&encoded).unwrap(), key);
    }

    #[test]
    fn short_key_rejected() {
        let encoded = BASE64.encode([1u8; 16]);
        assert!(key_from_base64(&encoded).is_err());
    }

    #[test]
    fn resolve_prefers_encoded_key() {
        let key = generate_shared_key();
        let encoded = key_to_base64(&key);
        let (resolved, origin) = resolve_shared_key(Some(&encoded), Some("pw")).unwrap();
        assert_eq!(resolved, key);
        assert_eq!(origin, KeyOrigin::Encoded);
    }

    #[test]
    fn resolve_falls_back_to_builtin() {
        let (resolved, origin) = resolve_shared_key(None, Some("")).unwrap();
        assert_eq!(origin, KeyOrigin::BuiltIn);
        assert_eq!(resolved, key_from_passphrase(DEFAULT_PASSPHRASE));

        let (from_pw, origin) = resolve_shared_key(Some("  "), Some("pw")).unwrap();
        assert_eq!(origin, KeyOrigin::Passphrase);
        assert_ne!(from_pw, resolved);
    }
}
