// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use serde::{Deserialize, Serialize};
use figment::{Figment, providers::{Env, Format, Json, Serialized, Toml, Yaml}};
use anyhow::Result;
use crate::auth::PasswordRequirements;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Bearer-token codec settings
    pub token: TokenSettings,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    /// OAuth providers the server accepts completed handshakes from,
    /// keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

/// Signing parameters for the bearer-token codec. The core never looks
/// inside these; they are handed to the codec as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// HMAC signing secret
    pub secret: String,
    /// Issuer claim stamped into and required of every token
    pub issuer: String,
    /// Token TTL in seconds
    pub ttl_secs: u64,
}

/// Client parameters for one OAuth provider. Consumed by whatever drives
/// the provider handshake; the backend only checks that a completed
/// handshake names a configured provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            session_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            token: TokenSettings::default(),
            password_requirements: PasswordRequirements::default(),
            providers: HashMap::new(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: "insecure-dev-secret-change-me".to_string(),
            issuer: "gatehouse".to_string(),
            ttl_secs: 60 * 60, // 1 hour
        }
    }
}

impl Settings {
    /// Load settings from config files and environment variables,
    /// layered over the built-in defaults
    pub fn load() -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("gatehouse.toml"))
            .merge(Yaml::file("gatehouse.yaml"))
            .merge(Json::file("gatehouse.json"))
            .merge(Env::prefixed("GATEHOUSE_").split("__"))
            .extract()?;

        Ok(settings)
    }

    /// Load settings from an explicit config file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GATEHOUSE_").split("__"))
            .extract()?;

        Ok(settings)
    }
}
