//! Application-level configuration loading.
//!
//! Tunables live in a JSON file; deployment concerns (ports, database URI,
//! secrets) come from environment variables read in `main`.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::DEFAULT_TRANSITION_TIMEOUT;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CT_CONTEST_CONFIG_PATH";
/// Environment variable selecting the storage backend (`memory` or `mongo`).
const STORE_ENV: &str = "CT_CONTEST_STORE";

const DEFAULT_SESSION_TTL_HOURS: u64 = 24;
const DEFAULT_LEADERBOARD_LIMIT: u32 = 5;
const DEFAULT_SSE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Lifetime of a login session token.
    pub session_ttl: Duration,
    /// Upper bound for the work inside a lifecycle transition; `None` disables it.
    pub transition_timeout: Option<Duration>,
    /// Page size used by `/leaderboard` when `limit` is omitted.
    pub leaderboard_default_limit: u32,
    /// Buffer size of the SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(path = %path.display(), "loaded configuration file");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; missing keys keep their default value.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    session_ttl_hours: Option<u64>,
    transition_timeout_secs: Option<u64>,
    leaderboard_default_limit: Option<u32>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let session_ttl_hours = value
            .session_ttl_hours
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        let transition_timeout = match value.transition_timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TRANSITION_TIMEOUT),
        };
        let leaderboard_default_limit = value
            .leaderboard_default_limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);

        Self {
            session_ttl: Duration::from_secs(session_ttl_hours.saturating_mul(3600)),
            transition_timeout,
            leaderboard_default_limit,
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_SSE_CAPACITY),
        }
    }
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Volatile in-process store.
    Memory,
    /// MongoDB, supervised with reconnects.
    Mongo,
}

impl StoreBackend {
    /// Read [`STORE_ENV`]; defaults to MongoDB when compiled in.
    pub fn from_env() -> Self {
        Self::parse(env::var(STORE_ENV).ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("mongo") | Some("mongodb") => StoreBackend::Mongo,
            Some(other) => {
                warn!(value = other, "unknown store backend; using the default");
                Self::default_backend()
            }
            None => Self::default_backend(),
        }
    }

    fn default_backend() -> Self {
        if cfg!(feature = "mongo-store") {
            StoreBackend::Mongo
        } else {
            StoreBackend::Memory
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.transition_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.leaderboard_default_limit, 5);
        assert_eq!(config.sse_capacity, 16);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config =
            AppConfig::from_json(r#"{"leaderboard_default_limit": 3, "transition_timeout_secs": 0}"#)
                .unwrap();
        assert_eq!(config.leaderboard_default_limit, 3);
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.transition_timeout, None);
        assert_eq!(config.sse_capacity, 16);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_json(r#"{"colors": []}"#).is_err());
    }

    #[test]
    fn store_backend_parsing() {
        assert_eq!(StoreBackend::parse(Some("memory")), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse(Some(" Mongo ")), StoreBackend::Mongo);
        assert_eq!(
            StoreBackend::parse(None),
            StoreBackend::default_backend()
        );
    }
}
