//! Environment-backed runtime configuration.
//!
//! Values come from the process environment after an optional `.env` file
//! has been loaded. Empty variables count as unset. Numeric values that fail
//! to parse are reported instead of falling back to their defaults.

use std::{fmt, num::NonZeroUsize, str::FromStr, time::Duration};

use moviedex_core::{
    backfill::{DEFAULT_WORKERS, PipelineConfig},
    providers::{OMDB_DEFAULT_BASE_URL, OmdbSettings},
};
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://movies.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8090;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{key} must be set")]
    Missing { key: &'static str },
}

#[derive(Clone, PartialEq, Eq)]
pub struct OmdbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for OmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OMDB_DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl OmdbConfig {
    /// The lookup credential. Only commands that contact the lookup service
    /// need it, so its absence is reported lazily.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::Missing { key: "OMDB_API_KEY" })
    }

    pub fn settings(&self) -> Result<OmdbSettings, ConfigError> {
        Ok(OmdbSettings::new(self.require_api_key()?)
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub omdb: OmdbConfig,
    pub poster_workers: NonZeroUsize,
    pub server_host: String,
    pub server_port: u16,
    /// Whether a `.env` file was found and applied.
    pub env_file_loaded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            omdb: OmdbConfig::default(),
            poster_workers: DEFAULT_WORKERS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            env_file_loaded: false,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_file_loaded = dotenvy::dotenv().is_ok();
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.env_file_loaded = env_file_loaded;
        Ok(config)
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let db_max_connections: u32 = parse_var(&var, "DB_MAX_CONNECTIONS")?
            .unwrap_or(defaults.db_max_connections);
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "pool needs at least one connection".to_string(),
            });
        }

        let timeout = parse_var::<u64>(&var, "OMDB_TIMEOUT_SECS")?
            .map(Duration::from_secs);

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections,
            omdb: OmdbConfig {
                api_key: var("OMDB_API_KEY"),
                base_url: var("OMDB_BASE_URL").unwrap_or(defaults.omdb.base_url),
                timeout,
            },
            poster_workers: parse_var(&var, "MOVIEDEX_POSTER_WORKERS")?
                .unwrap_or(defaults.poster_workers),
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var(&var, "SERVER_PORT")?
                .unwrap_or(defaults.server_port),
            env_file_loaded: false,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::with_workers(self.poster_workers)
    }
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => Err(ConfigError::Invalid {
                key,
                reason: err.to_string(),
                value,
            }),
        },
    }
}
