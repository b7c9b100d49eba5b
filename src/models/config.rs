//! Configuration data model and validation

use crate::config::privacy::parse_rating_overrides;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// VPN provider key selecting directory and file naming rules
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Directory holding host definition files; the provider default when unset
    #[serde(default)]
    pub config_directory: Option<PathBuf>,

    /// Probe attempts per host
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: f64,

    /// Hosts probed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// TCP port used by the connect prober
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,

    /// Blend region privacy ratings into the score
    #[serde(default = "default_privacy_enabled")]
    pub privacy_enabled: bool,

    /// Share of the score given to the privacy rating
    #[serde(default = "default_privacy_weight")]
    pub privacy_weight: f64,

    /// Rating overrides merged over the built-in table
    #[serde(default)]
    pub privacy_scores: BTreeMap<String, u8>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Where the plain-text report is saved
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Refresh the host directory from the provider before probing
    #[serde(default = "default_auto_download")]
    pub auto_download: bool,

    /// Provider listing the configuration archive is fetched from
    #[serde(default)]
    pub download_url: Option<String>,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            config_directory: None,
            ping_count: default_ping_count(),
            timeout_seconds: default_timeout_secs(),
            workers: default_workers(),
            probe_port: default_probe_port(),
            privacy_enabled: default_privacy_enabled(),
            privacy_weight: default_privacy_weight(),
            privacy_scores: BTreeMap::new(),
            enable_color: default_enable_color(),
            log_file: default_log_file(),
            auto_download: default_auto_download(),
            download_url: None,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the per-attempt timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }

    /// Validate the configuration and return the first error
    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(AppError::validation("Provider cannot be empty"));
        }

        if self.ping_count == 0 {
            return Err(AppError::validation("Ping count must be greater than 0"));
        }

        if self.ping_count > 100 {
            return Err(AppError::validation("Ping count cannot exceed 100"));
        }

        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(AppError::validation("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 60.0 {
            return Err(AppError::validation("Timeout cannot exceed 60 seconds"));
        }

        if self.workers == 0 {
            return Err(AppError::validation("Worker count must be greater than 0"));
        }

        if self.workers > 512 {
            return Err(AppError::validation("Worker count cannot exceed 512"));
        }

        if self.probe_port == 0 {
            return Err(AppError::validation("Probe port must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.privacy_weight) {
            return Err(AppError::validation(format!(
                "Privacy weight must be between 0.0 and 1.0, got: {}",
                self.privacy_weight
            )));
        }

        if let Some((tag, score)) = self.privacy_scores.iter().find(|(_, score)| **score > 100) {
            return Err(AppError::validation(format!("Privacy score for {} exceeds 100: {}", tag, score)));
        }

        if let Some(download_url) = &self.download_url {
            let parsed = Url::parse(download_url)
                .map_err(|e| AppError::validation(format!("Invalid download URL '{}': {}", download_url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "Download URL must use http or https, got: {}",
                    download_url
                )));
            }
        }

        Ok(())
    }

    /// Apply one environment variable to this configuration.
    ///
    /// Only parses; range checks are left to [`Config::validate`]. Unknown
    /// keys are ignored.
    pub fn apply_env_var(&mut self, key: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        match key {
            "VPN_PROVIDER" if !trimmed.is_empty() => self.provider = trimmed.to_string(),
            "CONFIG_DIRECTORY" if !trimmed.is_empty() => self.config_directory = Some(PathBuf::from(trimmed)),
            "PING_COUNT" => self.ping_count = parse_env(key, value)?,
            "PING_TIMEOUT" => self.timeout_seconds = parse_env(key, value)?,
            "WORKERS" => self.workers = parse_env(key, value)?,
            "PROBE_PORT" => self.probe_port = parse_env(key, value)?,
            "PRIVACY_ENABLED" => self.privacy_enabled = parse_env_bool(key, value)?,
            "PRIVACY_WEIGHT" => self.privacy_weight = parse_env(key, value)?,
            "PRIVACY_SCORES" => {
                // Malformed entries are skipped here and reported by the env checker
                let (overrides, _rejected) = parse_rating_overrides(trimmed);
                self.privacy_scores.extend(overrides);
            }
            "ENABLE_COLOR" => self.enable_color = parse_env_bool(key, value)?,
            "LOG_FILE" if !trimmed.is_empty() => self.log_file = PathBuf::from(trimmed),
            "AUTO_DOWNLOAD" => self.auto_download = parse_env_bool(key, value)?,
            "DOWNLOAD_URL" => {
                self.download_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        for key in ENV_VARS {
            if let Ok(value) = std::env::var(key) {
                self.apply_env_var(key, &value)?;
            }
        }
        Ok(())
    }
}

/// Environment variables read by [`Config::merge_from_env`]
pub const ENV_VARS: &[&str] = &[
    "VPN_PROVIDER",
    "CONFIG_DIRECTORY",
    "PING_COUNT",
    "PING_TIMEOUT",
    "WORKERS",
    "PROBE_PORT",
    "PRIVACY_ENABLED",
    "PRIVACY_WEIGHT",
    "PRIVACY_SCORES",
    "ENABLE_COLOR",
    "LOG_FILE",
    "AUTO_DOWNLOAD",
    "DOWNLOAD_URL",
];

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

fn parse_env_bool(key: &str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| AppError::config(format!("Invalid {} value '{}'", key, value)))
}

/// Accepts the boolean spellings common in `.env` files
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// Default value functions for serde
fn default_provider() -> String {
    crate::defaults::DEFAULT_PROVIDER.to_string()
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_ATTEMPT_COUNT
}

fn default_timeout_secs() -> f64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs_f64()
}

fn default_workers() -> usize {
    crate::defaults::DEFAULT_WORKERS
}

fn default_probe_port() -> u16 {
    crate::defaults::DEFAULT_PROBE_PORT
}

fn default_privacy_enabled() -> bool {
    crate::defaults::DEFAULT_PRIVACY_ENABLED
}

fn default_privacy_weight() -> f64 {
    crate::defaults::DEFAULT_PRIVACY_WEIGHT
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_auto_download() -> bool {
    crate::defaults::DEFAULT_AUTO_DOWNLOAD
}

fn default_log_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_LOG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ping_count, 4);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.workers, 20);
        assert_eq!(config.privacy_weight, 0.35);
        assert_eq!(config.provider, "ipvanish");
    }

    #[test]
    fn test_zero_ping_count_invalid() {
        let config = Config { ping_count: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(Config { timeout_seconds: 0.0, ..Config::default() }.validate().is_err());
        assert!(Config { timeout_seconds: 61.0, ..Config::default() }.validate().is_err());
        assert!(Config { timeout_seconds: f64::NAN, ..Config::default() }.validate().is_err());
        assert!(Config { timeout_seconds: 0.5, ..Config::default() }.validate().is_ok());
    }

    #[test]
    fn test_worker_bounds() {
        assert!(Config { workers: 0, ..Config::default() }.validate().is_err());
        assert!(Config { workers: 513, ..Config::default() }.validate().is_err());
    }

    #[test]
    fn test_privacy_weight_bounds() {
        assert!(Config { privacy_weight: -0.1, ..Config::default() }.validate().is_err());
        assert!(Config { privacy_weight: 1.5, ..Config::default() }.validate().is_err());
        assert!(Config { privacy_weight: 1.0, ..Config::default() }.validate().is_ok());
    }

    #[test]
    fn test_zero_port_invalid() {
        assert!(Config { probe_port: 0, ..Config::default() }.validate().is_err());
    }

    #[test]
    fn test_download_url_checked() {
        let config = Config { download_url: Some("ftp://configs.example/".into()), ..Config::default() };
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let config = Config { download_url: Some("not a url".into()), ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { download_url: Some("https://configs.example/openvpn/".into()), ..Config::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env_var() {
        let mut config = Config::default();
        config.apply_env_var("PING_COUNT", " 8 ").unwrap();
        config.apply_env_var("AUTO_DOWNLOAD", "off").unwrap();
        config.apply_env_var("DOWNLOAD_URL", "https://configs.example/").unwrap();
        config.apply_env_var("PRIVACY_SCORES", "US=30,bogus").unwrap();
        config.apply_env_var("VPN_PROVIDER", "  ").unwrap();
        config.apply_env_var("SOMETHING_ELSE", "x").unwrap();

        assert_eq!(config.ping_count, 8);
        assert!(!config.auto_download);
        assert_eq!(config.download_url.as_deref(), Some("https://configs.example/"));
        assert_eq!(config.privacy_scores.get("US"), Some(&30));
        assert_eq!(config.provider, "ipvanish");

        let error = config.apply_env_var("WORKERS", "many").unwrap_err();
        assert!(matches!(error, AppError::Config(_)));
        assert!(error.to_string().contains("Invalid WORKERS value 'many'"));

        // Out of range values parse; validation rejects them
        config.apply_env_var("WORKERS", "0").unwrap();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_bool_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"ping_count": 6}"#).unwrap();
        assert_eq!(config.ping_count, 6);
        assert_eq!(config.workers, 20);
        assert!(config.privacy_enabled);
        assert!(config.auto_download);
        assert_eq!(config.download_url, None);
    }
}
