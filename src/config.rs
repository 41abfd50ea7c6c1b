use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

/// Default reporting currency.
fn default_reporting_currency() -> String {
    "BRL".to_string()
}

/// Default environment variable holding the upstream API token.
fn default_auth_token_env() -> String {
    "FOLIOREPORT_UPSTREAM_TOKEN".to_string()
}

/// Default per-request timeout (30 seconds).
fn default_request_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(30)
}

/// Default retry attempts per feed call.
fn default_attempts() -> u32 {
    3
}

/// Default fixed backoff between retry attempts (250 milliseconds).
fn default_backoff() -> std::time::Duration {
    std::time::Duration::from_millis(250)
}

/// Default snapshot interval in whole days.
fn default_interval_days() -> u32 {
    1
}

/// Upstream feed endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the brokerage feed API. If unset, the built-in
    /// production endpoint is used.
    pub base_url: Option<String>,

    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Timeout applied to each individual feed request.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: std::time::Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token_env: default_auth_token_env(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry configuration for feed calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per feed call before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Fixed pause between attempts.
    #[serde(default = "default_backoff", deserialize_with = "deserialize_duration")]
    pub backoff: std::time::Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Report-construction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Path to the two-column category dictionary CSV. If relative, resolved
    /// from the config file location.
    pub category_file: Option<PathBuf>,

    /// Currency for reporting all values (e.g., "BRL").
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,

    /// Snapshot step and return-aggregation interval in whole days.
    #[serde(default = "default_interval_days")]
    pub interval_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            category_file: None,
            reporting_currency: default_reporting_currency(),
            interval_days: default_interval_days(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Upstream feed endpoint settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Retry settings for feed calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Report-construction settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the category dictionary path.
    ///
    /// If `category_file` is set and relative, it's resolved relative to
    /// `config_dir`. Returns `None` when no dictionary is configured.
    pub fn resolve_category_file(&self, config_dir: &Path) -> Option<PathBuf> {
        match &self.report.category_file {
            Some(file) if file.is_absolute() => Some(file.clone()),
            Some(file) => Some(config_dir.join(file)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream.base_url, None);
        assert_eq!(config.upstream.auth_token_env, "FOLIOREPORT_UPSTREAM_TOKEN");
        assert_eq!(
            config.upstream.request_timeout,
            std::time::Duration::from_secs(30)
        );
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.backoff, std::time::Duration::from_millis(250));
        assert_eq!(config.report.reporting_currency, "BRL");
        assert_eq!(config.report.interval_days, 1);
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("folioreport.toml");

        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.upstream.base_url, None);
        assert_eq!(config.retry.attempts, 3);

        Ok(())
    }

    #[test]
    fn test_load_upstream_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("folioreport.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[upstream]")?;
        writeln!(file, "base_url = \"https://feeds.test\"")?;
        writeln!(file, "auth_token_env = \"BROKER_TOKEN\"")?;
        writeln!(file, "request_timeout = \"5s\"")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.upstream.base_url.as_deref(), Some("https://feeds.test"));
        assert_eq!(config.upstream.auth_token_env, "BROKER_TOKEN");
        assert_eq!(
            config.upstream.request_timeout,
            std::time::Duration::from_secs(5)
        );

        Ok(())
    }

    #[test]
    fn test_load_retry_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("folioreport.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[retry]")?;
        writeln!(file, "attempts = 5")?;
        writeln!(file, "backoff = \"500ms\"")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.backoff, std::time::Duration::from_millis(500));

        Ok(())
    }

    #[test]
    fn test_load_report_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("folioreport.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[report]")?;
        writeln!(file, "category_file = \"categories.csv\"")?;
        writeln!(file, "reporting_currency = \"USD\"")?;
        writeln!(file, "interval_days = 30")?;

        let config = Config::load(&config_path)?;
        assert_eq!(
            config.report.category_file,
            Some(PathBuf::from("categories.csv"))
        );
        assert_eq!(config.report.reporting_currency, "USD");
        assert_eq!(config.report.interval_days, 30);

        Ok(())
    }

    #[test]
    fn test_resolve_relative_category_file() {
        let config = Config {
            report: ReportConfig {
                category_file: Some(PathBuf::from("categories.csv")),
                ..Default::default()
            },
            ..Default::default()
        };
        let config_dir = Path::new("/home/user/reports");
        assert_eq!(
            config.resolve_category_file(config_dir),
            Some(PathBuf::from("/home/user/reports/categories.csv"))
        );
    }

    #[test]
    fn test_resolve_absolute_category_file() {
        let config = Config {
            report: ReportConfig {
                category_file: Some(PathBuf::from("/etc/folioreport/categories.csv")),
                ..Default::default()
            },
            ..Default::default()
        };
        let config_dir = Path::new("/home/user/reports");
        assert_eq!(
            config.resolve_category_file(config_dir),
            Some(PathBuf::from("/etc/folioreport/categories.csv"))
        );
    }

    #[test]
    fn test_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("missing.toml");

        let config = Config::load_or_default(&config_path)?;
        assert_eq!(config.report.reporting_currency, "BRL");

        Ok(())
    }
}
