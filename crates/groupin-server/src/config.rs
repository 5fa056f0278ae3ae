//! Relay configuration parsed from environment variables.

use std::time::Duration;

use thiserror::Error;

use groupin_gateway::registry::DEFAULT_IDENTITY_SPACE;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySourceKind {
    Clock,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub identity_space: u32,
    pub identity_source: IdentitySourceKind,
    pub heartbeat: Duration,
}

impl ServerConfig {
    /// Build typed relay config from environment variables.
    ///
    /// Optional:
    /// - `GROUPIN_HOST`: default `0.0.0.0`
    /// - `GROUPIN_PORT`: default 5555
    /// - `GROUPIN_IDENTITY_SPACE`: identities are drawn from `0..space`, default 1000
    /// - `GROUPIN_IDENTITY_SOURCE`: `clock` (default) or `random`
    /// - `GROUPIN_HEARTBEAT_SECS`: ping interval, default 15
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("GROUPIN_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("GROUPIN_PORT", lookup("GROUPIN_PORT"), DEFAULT_PORT, "a port number")?;
        let identity_space = parse_or(
            "GROUPIN_IDENTITY_SPACE",
            lookup("GROUPIN_IDENTITY_SPACE"),
            DEFAULT_IDENTITY_SPACE,
            "a positive integer",
        )?;
        if identity_space == 0 {
            return Err(ConfigError::Invalid {
                var: "GROUPIN_IDENTITY_SPACE",
                expected: "a positive integer",
                value: "0".into(),
            });
        }
        let identity_source = parse_source(lookup("GROUPIN_IDENTITY_SOURCE").as_deref())?;
        let heartbeat_secs = parse_or(
            "GROUPIN_HEARTBEAT_SECS",
            lookup("GROUPIN_HEARTBEAT_SECS"),
            DEFAULT_HEARTBEAT_SECS,
            "a number of seconds",
        )?;

        Ok(Self {
            host,
            port,
            identity_space,
            identity_source,
            heartbeat: Duration::from_secs(heartbeat_secs.max(1)),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, expected, value }),
    }
}

fn parse_source(raw: Option<&str>) -> Result<IdentitySourceKind, ConfigError> {
    match raw.map(str::trim).unwrap_or("clock") {
        "clock" => Ok(IdentitySourceKind::Clock),
        "random" => Ok(IdentitySourceKind::Random),
        other => Err(ConfigError::Invalid {
            var: "GROUPIN_IDENTITY_SOURCE",
            expected: "'clock' or 'random'",
            value: other.to_string(),
        }),
    }
}
