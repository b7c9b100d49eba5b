//! Configuration validation utilities and rules

use crate::{
    config::privacy::DEFAULT_REGION_RATINGS,
    error::Result,
    models::Config,
};

/// Configuration validator with advisory rules on top of [`Config::validate`]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration and collect non-fatal warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_probe_settings(config));
        warnings.extend(Self::validate_privacy_settings(config));
        Ok(warnings)
    }

    /// Validate probe-related settings
    fn validate_probe_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.ping_count < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Ping count of {} gives little or no jitter data (recommended: >= 3)",
                    config.ping_count
                ),
            ));
        } else if config.ping_count > 20 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("High ping count of {} will increase execution time", config.ping_count),
            ));
        }

        if config.timeout_seconds < 1.0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s may mark distant endpoints as unreachable",
                    config.timeout_seconds
                ),
            ));
        }

        if config.workers > 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} concurrent workers may saturate the link and inflate latency",
                    config.workers
                ),
            ));
        }

        warnings
    }

    /// Validate privacy weighting settings
    fn validate_privacy_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.privacy_enabled && config.privacy_weight == 0.0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Privacy weighting is enabled with weight 0.0 and has no effect".to_string(),
            ));
        }

        if config.privacy_enabled && config.privacy_weight > 0.8 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Privacy weight {} lets region ratings dominate network quality",
                    config.privacy_weight
                ),
            ));
        }

        for tag in config.privacy_scores.keys() {
            let known = DEFAULT_REGION_RATINGS.iter().any(|(known, _)| known == tag);
            if !known {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Privacy score override for {} adds a region not in the built-in table", tag),
                ));
            }
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
                ValidationLevel::Error => self.level.as_str().red(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_warnings() {
        let warnings = validate_config(&Config::default()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_low_ping_count_warns() {
        let config = Config { ping_count: 1, ..Config::default() };
        let warnings = validate_config(&config).unwrap();

        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Warning && w.message.contains("jitter")));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = Config { workers: 0, ..Config::default() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_privacy_warnings() {
        let mut config = Config { privacy_weight: 0.9, ..Config::default() };
        config.privacy_scores.insert("XX".to_string(), 50);

        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("dominate")));
        assert!(warnings.iter().any(|w| w.message.contains("XX")));
    }

    #[test]
    fn test_warning_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "careful".to_string());
        assert_eq!(warning.format(false), "[WARNING] careful");
    }
}
