//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    load_env_file: bool,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli, load_env_file: true }
    }

    /// Skip reading `.env`; process environment and CLI still apply
    pub fn without_env_file(mut self) -> Self {
        self.load_env_file = false;
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        if self.load_env_file {
            EnvManager::load_env_file()?;
        }

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(pings) = self.cli.pings {
            config.ping_count = pings;
        }

        if let Some(workers) = self.cli.workers {
            config.workers = workers;
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(ref directory) = self.cli.directory {
            config.config_directory = Some(directory.clone());
        }

        if let Some(ref provider) = self.cli.provider {
            config.provider = provider.clone();
        }

        if let Some(port) = self.cli.port {
            config.probe_port = port;
        }

        if self.cli.no_privacy {
            config.privacy_enabled = false;
        }

        if let Some(weight) = self.cli.privacy_weight {
            config.privacy_weight = weight;
        }

        if let Some(ref log_file) = self.cli.log_file {
            config.log_file = log_file.clone();
        }

        if self.cli.no_download {
            config.auto_download = false;
        }

        if let Some(ref download_url) = self.cli.download_url {
            config.download_url = Some(download_url.clone());
        }

        if self.cli.color {
            config.enable_color = true;
        }
        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Provider: {}", config.provider));
    summary.push(format!(
        "Directory: {}",
        config
            .config_directory
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(provider default)".to_string())
    ));
    summary.push(format!("Pings per host: {}", config.ping_count));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Workers: {}", config.workers));
    summary.push(format!("Probe port: {}", config.probe_port));
    summary.push(format!(
        "Privacy weighting: {}",
        if config.privacy_enabled {
            format!("enabled ({:.0}%)", config.privacy_weight * 100.0)
        } else {
            "disabled".to_string()
        }
    ));
    summary.push(format!(
        "Download: {}",
        match (&config.download_url, config.auto_download) {
            (Some(url), true) => format!("from {}", url),
            (None, true) => "no download URL set".to_string(),
            (_, false) => "disabled".to_string(),
        }
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Report file: {}", config.log_file.display()));

    summary.join("\n")
}
