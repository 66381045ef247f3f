//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TIME_CAPSULE_API_BASE_URL` - Backend API root (default: `http://localhost:8080/api`)
//! - `TIME_CAPSULE_API_TIMEOUT_MS` - Per-request timeout (default: 10000)
//! - `TIME_CAPSULE_STATE_DIR` - Directory for durable slots (default: `.time-capsule`)
//! - `TIME_CAPSULE_COUNTDOWN_TICK_MS` - Countdown refresh period (default: 1000)
//! - `TIME_CAPSULE_PAGE_SIZE` - Admin listing page size (default: 20)
//! - `TIME_CAPSULE_LOG_JSON` - Emit JSON logs when `true` or `1` (default: text)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_STATE_DIR: &str = ".time-capsule";
const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1_000;
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API root; endpoint paths are appended to it.
    pub api_base_url: Url,
    /// Timeout applied to every request.
    pub api_timeout: Duration,
    /// Directory backing [`crate::storage::FileStorage`].
    pub state_dir: PathBuf,
    /// How often a sealed capsule's countdown is re-evaluated.
    pub countdown_tick: Duration,
    /// Default page size for the admin listing.
    pub page_size: u32,
    /// JSON log output instead of human-readable text.
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            api_timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            countdown_tick: Duration::from_millis(DEFAULT_COUNTDOWN_TICK_MS),
            page_size: DEFAULT_PAGE_SIZE,
            log_json: false,
        }
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid")
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = match get("TIME_CAPSULE_API_BASE_URL") {
            Some(raw) => parse_base_url(&raw)?,
            None => default_base_url(),
        };
        let api_timeout = Duration::from_millis(parse_positive(
            get("TIME_CAPSULE_API_TIMEOUT_MS"),
            "TIME_CAPSULE_API_TIMEOUT_MS",
            DEFAULT_API_TIMEOUT_MS,
        )?);
        let state_dir = get("TIME_CAPSULE_STATE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);
        let countdown_tick = Duration::from_millis(parse_positive(
            get("TIME_CAPSULE_COUNTDOWN_TICK_MS"),
            "TIME_CAPSULE_COUNTDOWN_TICK_MS",
            DEFAULT_COUNTDOWN_TICK_MS,
        )?);
        let page_size = parse_positive(
            get("TIME_CAPSULE_PAGE_SIZE"),
            "TIME_CAPSULE_PAGE_SIZE",
            DEFAULT_PAGE_SIZE,
        )?;
        let log_json = get("TIME_CAPSULE_LOG_JSON")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"));

        Ok(Self {
            api_base_url,
            api_timeout,
            state_dir,
            countdown_tick,
            page_size,
            log_json,
        })
    }
}

/// Parse the base URL, forcing a trailing slash so `Url::join` appends
/// instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("TIME_CAPSULE_API_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "TIME_CAPSULE_API_BASE_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_positive<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value == T::default() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.countdown_tick, Duration::from_secs(1));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.state_dir, PathBuf::from(".time-capsule"));
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TIME_CAPSULE_API_BASE_URL", "https://capsule.example.com/api"),
            ("TIME_CAPSULE_API_TIMEOUT_MS", "2500"),
            ("TIME_CAPSULE_STATE_DIR", "/var/lib/capsule"),
            ("TIME_CAPSULE_COUNTDOWN_TICK_MS", "250"),
            ("TIME_CAPSULE_PAGE_SIZE", "50"),
            ("TIME_CAPSULE_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(
            config.api_base_url.as_str(),
            "https://capsule.example.com/api/"
        );
        assert_eq!(config.api_timeout, Duration::from_millis(2500));
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/capsule"));
        assert_eq!(config.countdown_tick, Duration::from_millis(250));
        assert_eq!(config.page_size, 50);
        assert!(config.log_json);
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let config = ClientConfig::from_lookup(lookup(&[(
            "TIME_CAPSULE_API_BASE_URL",
            "http://127.0.0.1:9000/api",
        )]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9000/api/");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[("TIME_CAPSULE_API_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TIME_CAPSULE_API_BASE_URL"));

        let err = ClientConfig::from_lookup(lookup(&[(
            "TIME_CAPSULE_API_BASE_URL",
            "ftp://example.com",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_zero_and_garbage_numbers_rejected() {
        assert!(
            ClientConfig::from_lookup(lookup(&[("TIME_CAPSULE_COUNTDOWN_TICK_MS", "0")])).is_err()
        );
        assert!(ClientConfig::from_lookup(lookup(&[("TIME_CAPSULE_PAGE_SIZE", "many")])).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("TIME_CAPSULE_PAGE_SIZE", "  ")])).unwrap();
        assert_eq!(config.page_size, 20);
    }
}
