//! Environment variable handling and .env file management

use crate::config::privacy::parse_rating_overrides;
use crate::error::{AppError, Result};
use crate::models::Config;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the working directory if it exists.
    ///
    /// Returns whether a file was loaded. Variables already set in the
    /// process environment keep their values.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# StealthSpanner Configuration
#
# Values here override the built-in defaults and are themselves overridden
# by command-line arguments.

# VPN provider whose file naming rules apply
# VPN_PROVIDER=ipvanish

# Directory containing .ovpn host definition files
# CONFIG_DIRECTORY=IPVanish

# Probe attempts per host (1-100)
# PING_COUNT=4

# Per-attempt timeout in seconds (0-60)
# PING_TIMEOUT=3.0

# Hosts probed concurrently (1-512)
# WORKERS=20

# TCP port used for round-trip probes
# PROBE_PORT=443

# Blend region privacy ratings into the score (true/false)
# PRIVACY_ENABLED=true

# Share of the score given to the privacy rating (0.0-1.0)
# PRIVACY_WEIGHT=0.35

# Rating overrides merged over the built-in table
# PRIVACY_SCORES=US=30,NL=55

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Where the plain-text report is saved
# LOG_FILE=stealthspanner.log

# Refresh the config directory from the provider before probing (true/false)
# AUTO_DOWNLOAD=true

# Provider listing of versioned config archives; downloads are skipped when unset
# DOWNLOAD_URL=https://configs.example/openvpn/
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Check a single environment variable the way a run would read it.
    ///
    /// The value is applied to a default configuration which is then
    /// validated, so the same parser and range checks apply. Malformed
    /// `PRIVACY_SCORES` entries, which a run skips, are reported here.
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        if key == "PRIVACY_SCORES" {
            let (_, rejected) = parse_rating_overrides(value);
            if !rejected.is_empty() {
                return Err(AppError::config(format!(
                    "Invalid PRIVACY_SCORES entries: {}",
                    rejected.join(", ")
                )));
            }
        }

        let mut scratch = Config::default();
        scratch.apply_env_var(key, value)?;
        scratch.validate()
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("VPN_PROVIDER", "VPN provider key", "ipvanish"),
            ("CONFIG_DIRECTORY", "Directory of .ovpn host files", "IPVanish"),
            ("PING_COUNT", "Probe attempts per host (1-100)", "4"),
            ("PING_TIMEOUT", "Per-attempt timeout in seconds", "3.0"),
            ("WORKERS", "Hosts probed concurrently (1-512)", "20"),
            ("PROBE_PORT", "TCP port used for probes", "443"),
            ("PRIVACY_ENABLED", "Blend region privacy ratings into the score", "true"),
            ("PRIVACY_WEIGHT", "Share of the score given to privacy (0-1)", "0.35"),
            ("PRIVACY_SCORES", "Rating overrides", "US=30,NL=55"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_FILE", "Report file path", "stealthspanner.log"),
            ("AUTO_DOWNLOAD", "Refresh provider files before probing", "true"),
            ("DOWNLOAD_URL", "Provider listing to download from", "https://configs.example/openvpn/"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
