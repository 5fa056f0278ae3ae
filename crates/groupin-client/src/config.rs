//! Client configuration parsed from environment variables.

use thiserror::Error;
use tracing::warn;

use groupin_crypto::keys::{KeyOrigin, resolve_shared_key};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5555/gateway";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROUPIN_SHARED_KEY is not a base64 32-byte key: {0}")]
    InvalidKey(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub display_name: Option<String>,
    pub key: [u8; 32],
    pub key_origin: KeyOrigin,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `GROUPIN_SERVER_URL`: default `ws://127.0.0.1:5555/gateway`
    /// - `GROUPIN_NAME`: display name; prompted for when absent
    /// - `GROUPIN_SHARED_KEY`: base64 of the 32-byte shared key
    /// - `GROUPIN_PASSPHRASE`: used when no key is given
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup("GROUPIN_SERVER_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let display_name = lookup("GROUPIN_NAME").filter(|s| !s.trim().is_empty());

        let encoded = lookup("GROUPIN_SHARED_KEY");
        let passphrase = lookup("GROUPIN_PASSPHRASE");
        let (key, key_origin) = resolve_shared_key(encoded.as_deref(), passphrase.as_deref())
            .map_err(ConfigError::InvalidKey)?;
        if key_origin == KeyOrigin::BuiltIn {
            warn!("No GROUPIN_SHARED_KEY or GROUPIN_PASSPHRASE set, using the built-in key");
        }

        Ok(Self {
            server_url,
            display_name,
            key,
            key_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use groupin_crypto::keys::{generate_shared_key, key_to_base64};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.server_url, DEFAULT_SERVER_URL);
        assert_eq!(cfg.display_name, None);
        assert_eq!(cfg.key_origin, KeyOrigin::BuiltIn);
    }

    #[test]
    fn explicit_values() {
        let key = generate_shared_key();
        let encoded = key_to_base64(&key);
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("GROUPIN_SERVER_URL", "ws://chat.local:9000/gateway"),
            ("GROUPIN_NAME", "ana"),
            ("GROUPIN_SHARED_KEY", &encoded),
        ]))
        .unwrap();
        assert_eq!(cfg.server_url, "ws://chat.local:9000/gateway");
        assert_eq!(cfg.display_name.as_deref(), Some("ana"));
        assert_eq!(cfg.key, key);
        assert_eq!(cfg.key_origin, KeyOrigin::Encoded);
    }

    #[test]
    fn bad_key_is_an_error() {
        let result = ClientConfig::from_lookup(lookup(&[("GROUPIN_SHARED_KEY", "short")]));
        assert!(matches!(result, Err(ConfigError::InvalidKey(_))));
    }
}
