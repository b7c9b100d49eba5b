//! Error handling for the StealthSpanner probing engine
//!
//! Per-host probe failures are never errors at this level: they are folded
//! into each host's [`crate::types::TerminalStatus`]. `AppError` covers the
//! failures that stop a run before or around a batch, such as bad
//! configuration or an unreadable host directory. Download failures are
//! reported as warnings by the caller.

use thiserror::Error;

/// Custom error types for StealthSpanner
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (numbers, booleans, patterns, JSON)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Host definition discovery errors
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// A provider key that has no registered implementation
    #[error("Unsupported VPN provider: {0}")]
    UnsupportedProvider(String),

    /// DNS resolver setup errors
    #[error("DNS error: {0}")]
    Dns(String),

    /// Provider configuration download errors
    #[error("Download error: {0}")]
    Download(String),

    /// Batch execution errors
    #[error("Execution error: {0}")]
    Execution(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new discovery error
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        Self::Discovery(message.into())
    }

    /// Create a new unsupported-provider error
    pub fn unsupported_provider<S: Into<String>>(name: S) -> Self {
        Self::UnsupportedProvider(name.into())
    }

    /// Create a new DNS error
    pub fn dns<S: Into<String>>(message: S) -> Self {
        Self::Dns(message.into())
    }

    /// Create a new download error
    pub fn download<S: Into<String>>(message: S) -> Self {
        Self::Download(message.into())
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::Execution(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Discovery(_) => "DISCOVERY",
            Self::UnsupportedProvider(_) => "PROVIDER",
            Self::Dns(_) => "DNS",
            Self::Download(_) => "DOWNLOAD",
            Self::Execution(_) => "EXECUTION",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnsupportedProvider(_) => 1,
            Self::Dns(_) => 2,
            Self::Discovery(_) => 3,
            Self::Download(_) => 4,
            Self::Io(_) => 5,
            Self::Execution(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnsupportedProvider(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Dns(_) | Self::Download(_) | Self::Discovery(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Io(_) | Self::Execution(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<regex::Error> for AppError {
    fn from(error: regex::Error) -> Self {
        Self::internal(format!("Invalid file name pattern: {}", error))
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns(error.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::download(format!("Request timed out: {}", error))
        } else {
            Self::download(error.to_string())
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::download(format!("Invalid archive: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<tokio::sync::AcquireError> for AppError {
    fn from(error: tokio::sync::AcquireError) -> Self {
        Self::execution(format!("Worker pool closed: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
