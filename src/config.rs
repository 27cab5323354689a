//! Runtime configuration
//!
//! Read once at startup from `CALORIE_BETA_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::openfoodfacts::DEFAULT_BASE_URL as OPENFOODFACTS_URL;

pub const ENV_DATABASE_PATH: &str = "CALORIE_BETA_DATABASE_PATH";
pub const ENV_USER_ID: &str = "CALORIE_BETA_USER_ID";
pub const ENV_FATSECRET_URL: &str = "CALORIE_BETA_FATSECRET_URL";
pub const ENV_OPENFOODFACTS_URL: &str = "CALORIE_BETA_OPENFOODFACTS_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CALORIE_BETA_HTTP_TIMEOUT_SECS";

const DEFAULT_USER_ID: &str = "local";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    /// User for tool calls that do not name one
    pub default_user_id: String,
    /// FatSecret proxy; FatSecret lookups are skipped when unset
    pub fatsecret_url: Option<String>,
    pub openfoodfacts_url: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout_secs = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!("Invalid {}='{}', using {}s", ENV_HTTP_TIMEOUT_SECS, raw, DEFAULT_HTTP_TIMEOUT_SECS);
                DEFAULT_HTTP_TIMEOUT_SECS
            }),
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Self {
            database_path: get(ENV_DATABASE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            default_user_id: get(ENV_USER_ID).unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            fatsecret_url: get(ENV_FATSECRET_URL),
            openfoodfacts_url: get(ENV_OPENFOODFACTS_URL).unwrap_or_else(|| OPENFOODFACTS_URL.to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        }
    }
}

/// `<project>/data/calorie_beta.db`, where a binary under target/{debug,release}
/// resolves to the project root
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("calorie_beta.db");
    path
}
