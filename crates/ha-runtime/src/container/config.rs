//! # Server Configuration
//!
//! Defaults, then environment, then command-line flags.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `EPIDOSE_DATABASE` | `storage.database` |
//! | `EPIDOSE_FILTER` | `storage.filter` |
//! | `EPIDOSE_BIND` | `network.host` |
//! | `EPIDOSE_PORT` | `network.port` |
//! | `EPIDOSE_HMAC_SECRET` | `security.hmac_secret` (64 hex chars) |
//!
//! ## Security Requirements
//!
//! - `hmac_secret` MUST NOT be the default zero value outside debug mode

use ha_02_contagion_filter::FilterConfig;
use ha_03_ingestion::IngestionConfig;
use ha_05_api_gateway::{GatewayConfig, DEFAULT_MAX_BODY_BYTES};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Length of the token signing secret.
pub const HMAC_SECRET_LENGTH: usize = 32;

pub const DEFAULT_DATABASE: &str = "/var/lib/epidose/server-database.db";
pub const DEFAULT_FILTER: &str = "/var/lib/epidose/filter.bin";

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub filter: FilterConfig,
    pub ingestion: IngestionConfig,
    /// Debug mode: enables `GET /shutdown`.
    pub debug: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            host: gateway.host,
            port: gateway.port,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub filter: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            filter: PathBuf::from(DEFAULT_FILTER),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Signs reporter tokens. MUST be overridden in production.
    pub hmac_secret: [u8; HMAC_SECRET_LENGTH],
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hmac_secret: [0u8; HMAC_SECRET_LENGTH],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: HMAC secret is the default zero value. \
         Set EPIDOSE_HMAC_SECRET or run with --debug."
    )]
    InsecureHmacSecret,

    #[error("EPIDOSE_HMAC_SECRET must be 32 bytes of hex ({0})")]
    BadHmacSecret(String),

    #[error("Invalid filter configuration: {0}")]
    Filter(String),

    #[error("Invalid gateway configuration: {0}")]
    Gateway(String),
}

/// Decode a hex signing secret.
pub fn parse_hmac_secret(text: &str) -> Result<[u8; HMAC_SECRET_LENGTH], ConfigError> {
    let bytes = hex::decode(text.trim()).map_err(|e| ConfigError::BadHmacSecret(e.to_string()))?;
    <[u8; HMAC_SECRET_LENGTH]>::try_from(bytes.as_slice())
        .map_err(|_| ConfigError::BadHmacSecret(format!("got {} bytes", bytes.len())))
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`; unparseable addresses and ports are
    /// ignored with a warning, a malformed secret is an error.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("EPIDOSE_DATABASE") {
            self.storage.database = PathBuf::from(path);
        }
        if let Some(path) = lookup("EPIDOSE_FILTER") {
            self.storage.filter = PathBuf::from(path);
        }
        if let Some(host) = lookup("EPIDOSE_BIND") {
            match host.parse() {
                Ok(addr) => self.network.host = addr,
                Err(_) => warn!(value = %host, "EPIDOSE_BIND is not an IP address, ignored"),
            }
        }
        if let Some(port) = lookup("EPIDOSE_PORT") {
            match port.parse() {
                Ok(p) => self.network.port = p,
                Err(_) => warn!(value = %port, "EPIDOSE_PORT is not a port number, ignored"),
            }
        }
        if let Some(secret) = lookup("EPIDOSE_HMAC_SECRET") {
            self.security.hmac_secret = parse_hmac_secret(&secret)?;
            info!("Loaded HMAC secret from environment");
        }
        Ok(())
    }

    /// Refuse to run outside debug mode with settings unsafe for production.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.filter
            .validate()
            .map_err(|e| ConfigError::Filter(e.to_string()))?;
        self.gateway().validate().map_err(ConfigError::Gateway)?;

        if self.security.hmac_secret == [0u8; HMAC_SECRET_LENGTH] {
            if !self.debug {
                return Err(ConfigError::InsecureHmacSecret);
            }
            warn!("Running with the zero HMAC secret; tokens are forgeable");
        }
        Ok(())
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            host: self.network.host,
            port: self.network.port,
            max_body_bytes: self.network.max_body_bytes,
            debug: self.debug,
        }
    }
}
