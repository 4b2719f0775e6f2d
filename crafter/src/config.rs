//! User configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing file, a missing key, or a file that fails
//! to parse all produce a working configuration. Parse failures are logged and then
//! ignored.

use std::path::PathBuf;
use std::time::Duration;

use crafter_core::service::ServiceConfig;
use crafter_core::submit::RetryPolicy;
use serde::Deserialize;

/// Environment variable that overrides `server_url`.
pub const SERVER_URL_ENV: &str = "CRAFTER_SERVER_URL";

/// Retry knobs exposed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme name, see [`crate::theme::Theme::from_name`].
    pub theme: String,
    /// Base URL of the code service.
    pub server_url: String,
    pub request_timeout_secs: u64,
    /// Directory the export key writes into.
    pub export_dir: PathBuf,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        let service = ServiceConfig::default();
        Self {
            theme: "catppuccin-mocha".to_owned(),
            server_url: service.base_url,
            request_timeout_secs: service.timeout.as_secs(),
            export_dir: PathBuf::from("."),
            retry: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Loads the config file and applies environment overrides.
    pub fn load() -> Self {
        let path = config_path();
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => Self::from_toml_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                config.server_url = url;
            }
        }
        config
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Service settings; a timeout of zero is raised to one second.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            base_url: self.server_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    /// Retry policy; an attempt budget of zero is raised to one.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Returns the path to the crafter config file.
///
/// Prefers `$XDG_CONFIG_HOME/crafter/config.toml`; falls back to
/// `~/.config/crafter/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("crafter").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(
            "server_url = \"http://localhost:8080\"\n[retry]\nmax_attempts = 5\n",
        )
        .unwrap();
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 2000);
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn retry_policy_never_drops_below_one_attempt() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn zero_timeout_is_raised_to_one_second() {
        let config = Config::from_toml_str("request_timeout_secs = 0").unwrap();
        assert_eq!(config.service_config().timeout, Duration::from_secs(1));
        assert_eq!(Config::default().service_config().timeout, Duration::from_secs(60));
    }

    #[test]
    fn bad_types_are_reported() {
        assert!(Config::from_toml_str("request_timeout_secs = \"soon\"").is_err());
    }
}
