// Runtime configuration, read once from the environment at startup.
//
// A `.env` file in the working directory is loaded first if present.
// Every setting has a default; a value that fails to parse is logged and replaced
// by that default instead of aborting startup.

use crate::core::moderation::ModerationConfig;
use crate::infra::moderation::openai_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::str::FromStr;
use std::time::Duration;

pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// SQLite URL or path
    pub database_url: String,
    /// Enables the remote classifier when set
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub moderation: ModerationConfig,
    pub session_ttl: chrono::Duration,
    /// Mark the session cookie `Secure` (only when served over HTTPS)
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let timeout_secs: u64 = parsed(&lookup, "MODERATION_TIMEOUT_SECS", 5);
        let cache_capacity: usize = parsed(&lookup, "MODERATION_CACHE_SIZE", 5_000);
        let ttl_hours: i64 = parsed(&lookup, "SESSION_TTL_HOURS", 24);

        Self {
            bind_addr: text("BIND_ADDR", "127.0.0.1:5000"),
            database_url: text("DATABASE_URL", "sqlite://data/campus.db"),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: text("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            openai_model: text("OPENAI_MODERATION_MODEL", DEFAULT_MODEL),
            moderation: ModerationConfig {
                cache_capacity,
                classifier_timeout: Duration::from_secs(timeout_secs),
            },
            session_ttl: chrono::Duration::hours(ttl_hours),
            cookie_secure: parsed(&lookup, "COOKIE_SECURE", false),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.database_url, "sqlite://data/campus.db");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.openai_model, "omni-moderation-latest");
        assert_eq!(config.moderation.cache_capacity, 5_000);
        assert_eq!(config.moderation.classifier_timeout, Duration::from_secs(5));
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("OPENAI_API_KEY", "sk-test"),
            ("MODERATION_CACHE_SIZE", "10"),
            ("MODERATION_TIMEOUT_SECS", "2"),
            ("COOKIE_SECURE", "true"),
        ]);

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.moderation.cache_capacity, 10);
        assert_eq!(config.moderation.classifier_timeout, Duration::from_secs(2));
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[
            ("MODERATION_CACHE_SIZE", "lots"),
            ("SESSION_TTL_HOURS", "-x"),
            ("OPENAI_API_KEY", "  "),
        ]);

        assert_eq!(config.moderation.cache_capacity, 5_000);
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.openai_api_key, None);
    }
}
