//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_GENERATION_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset the service keeps profiles in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub generation_api_base: String,
    pub generation_model: String,
    pub generation_timeout: Duration,
    /// Upper bound on any single profile store call.
    pub store_timeout: Duration,
    pub session_max_age_days: i64,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            gemini_api_key: None,
            generation_api_base: DEFAULT_GENERATION_API_BASE.to_string(),
            generation_model: "gemini-2.0-flash".to_string(),
            generation_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
            session_max_age_days: 30,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a `Config` from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let gemini_api_key = lookup("GEMINI_API_KEY");

        // --- Load Adapter-specific Settings ---
        let generation_api_base =
            lookup("GENERATION_API_BASE").unwrap_or(defaults.generation_api_base);
        let generation_model = lookup("GENERATION_MODEL").unwrap_or(defaults.generation_model);

        let generation_timeout = match lookup("GENERATION_TIMEOUT_SECS") {
            Some(raw) => parse_positive("GENERATION_TIMEOUT_SECS", &raw).map(Duration::from_secs)?,
            None => defaults.generation_timeout,
        };

        let store_timeout = match lookup("STORE_TIMEOUT_SECS") {
            Some(raw) => parse_positive("STORE_TIMEOUT_SECS", &raw).map(Duration::from_secs)?,
            None => defaults.store_timeout,
        };

        let session_max_age_days = match lookup("SESSION_MAX_AGE_DAYS") {
            Some(raw) => parse_positive("SESSION_MAX_AGE_DAYS", &raw)? as i64,
            None => defaults.session_max_age_days,
        };

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            generation_api_base,
            generation_model,
            generation_timeout,
            store_timeout,
            session_max_age_days,
            cors_origin,
        })
    }
}

fn parse_positive(var: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.generation_model, "gemini-2.0-flash");
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert_eq!(config.session_max_age_days, 30);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/counsel"),
            ("RUST_LOG", "debug"),
            ("GENERATION_TIMEOUT_SECS", "5"),
            ("STORE_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/counsel"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.generation_timeout, Duration::from_secs(5));
        assert_eq!(config.store_timeout, Duration::from_secs(2));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "BIND_ADDRESS"
        ));
        assert!(matches!(
            config_from(&[("GENERATION_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "GENERATION_TIMEOUT_SECS"
        ));
        assert!(config_from(&[("RUST_LOG", "loud")]).is_err());
    }
}
