//! Runtime configuration loaded from the environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

/// Runtime configuration for the marketplace core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database_path: String,
    /// API key for the content classifier.
    pub audit_api_key: String,
    /// Secret key for the content classifier.
    pub audit_secret_key: String,
    /// Lifetime of cached search results in seconds.
    pub search_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    #[must_use]
    pub fn load() -> Self {
        Self {
            database_path: try_load("PLAZA_DATABASE_PATH", "plaza.db"),
            audit_api_key: try_load("PLAZA_AUDIT_API_KEY", ""),
            audit_secret_key: try_load("PLAZA_AUDIT_SECRET_KEY", ""),
            search_cache_ttl_secs: try_load("PLAZA_SEARCH_CACHE_TTL_SECS", "300"),
        }
    }

    /// Whether classifier credentials were provided.
    #[must_use]
    pub fn has_audit_credentials(&self) -> bool {
        !self.audit_api_key.is_empty() && !self.audit_secret_key.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "plaza.db".to_string(),
            audit_api_key: String::new(),
            audit_secret_key: String::new(),
            search_cache_ttl_secs: 300,
        }
    }
}

/// Read an environment variable, parsing it into the target type and
/// falling back to `default` (with a log line) when unset or invalid.
fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display + std::fmt::Debug,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?} ({e}), using default {default:?}");
            #[allow(clippy::expect_used)]
            default
                .parse()
                .expect("built-in configuration defaults parse")
        }
    }
}
