//! Studio configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STUDIO_HOST` - Bind address (default: 127.0.0.1)
//! - `STUDIO_PORT` - Listen port (default: 3000)
//! - `PERSONA_BACKEND_URL` - Base URL of the persona generator
//!   (falls back to `BACKEND_URL`, then `http://localhost:8000`)
//! - `STUDIO_REQUEST_TIMEOUT_SECS` - Timeout for generator requests (default: 60)
//! - `STUDIO_DATA_DIR` - Directory holding the saved description (default: ./data)
//! - `STUDIO_SEED_SAMPLE` - Start with the sample persona (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Generator base URL used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Studio application configuration.
#[derive(Clone)]
pub struct StudioConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upstream generator settings
    pub generator: GeneratorConfig,
    /// Directory for the persisted product description
    pub data_dir: PathBuf,
    /// Seed the collection with the sample persona
    pub seed_sample: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("generator", &self.generator)
            .field("data_dir", &self.data_dir)
            .field("seed_sample", &self.seed_sample)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// Upstream persona generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base URL; endpoint paths are joined onto it
    pub base_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl StudioConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = env_or("STUDIO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STUDIO_HOST".to_string(), e.to_string()))?;
        let port = env_or("STUDIO_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STUDIO_PORT".to_string(), e.to_string()))?;

        let generator = GeneratorConfig::from_lookup(&lookup)?;
        let data_dir = PathBuf::from(env_or("STUDIO_DATA_DIR", "./data"));
        let seed_sample = parse_bool("STUDIO_SEED_SAMPLE", &env_or("STUDIO_SEED_SAMPLE", "false"))?;

        Ok(Self {
            host,
            port,
            generator,
            data_dir,
            seed_sample,
            sentry_dsn: lookup("SENTRY_DSN")
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Point the generator at another base URL.
    #[must_use]
    pub fn with_backend(mut self, base_url: Url) -> Self {
        self.generator.base_url = base_url;
        self
    }

    /// Store the description somewhere else.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}

impl GeneratorConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // BACKEND_URL is the name older deployments use
        let (key, raw) = lookup("PERSONA_BACKEND_URL")
            .map(|v| ("PERSONA_BACKEND_URL", v))
            .or_else(|| lookup("BACKEND_URL").map(|v| ("BACKEND_URL", v)))
            .unwrap_or(("PERSONA_BACKEND_URL", DEFAULT_BACKEND_URL.to_string()));

        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be an http(s) base URL".to_string(),
            ));
        }

        let timeout_secs = lookup("STUDIO_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STUDIO_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
