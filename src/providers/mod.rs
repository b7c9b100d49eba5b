//! VPN provider registry
//!
//! Providers are selected by a string key. Each one knows where its host
//! definition files live by default and how a file name encodes the region.
//! [`download`] refreshes those files from the provider.

pub mod download;

pub use download::{download_provider_configs, ConfigDownloader, DownloadOutcome, DownloadSummary};

use crate::error::{AppError, Result};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported VPN providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VpnProvider {
    IpVanish,
}

impl VpnProvider {
    /// All registered providers
    pub const ALL: &'static [VpnProvider] = &[VpnProvider::IpVanish];

    /// Lookup key accepted by [`FromStr`]
    pub fn key(&self) -> &'static str {
        match self {
            Self::IpVanish => "ipvanish",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IpVanish => "IPVanish",
        }
    }

    /// Directory used when no directory is configured
    pub fn default_directory(&self) -> PathBuf {
        match self {
            Self::IpVanish => PathBuf::from("IPVanish"),
        }
    }

    /// Pattern whose first capture group is the region tag
    fn region_pattern(&self) -> &'static str {
        match self {
            // ipvanish-CH-Zurich-zrh-c18.ovpn
            Self::IpVanish => r"^ipvanish-([A-Za-z]{2})-",
        }
    }

    /// Compile this provider's file naming rule
    pub fn naming_rule(&self) -> Result<FileNamingRule> {
        Ok(FileNamingRule {
            provider: *self,
            pattern: Regex::new(self.region_pattern())?,
        })
    }

    /// Comma-separated list of supported keys, for error hints
    pub fn supported_keys() -> String {
        Self::ALL.iter().map(|p| p.key()).collect::<Vec<_>>().join(", ")
    }
}

impl FromStr for VpnProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|provider| provider.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::unsupported_provider(wanted))
    }
}

impl fmt::Display for VpnProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Compiled file-name to region-tag rule for one provider
#[derive(Debug, Clone)]
pub struct FileNamingRule {
    provider: VpnProvider,
    pattern: Regex,
}

impl FileNamingRule {
    pub fn provider(&self) -> VpnProvider {
        self.provider
    }

    /// Upper-cased region tag encoded in `file_name`, if it follows the pattern
    pub fn region_tag(&self, file_name: &str) -> Option<String> {
        self.pattern
            .captures(file_name)
            .and_then(|captures| captures.get(1))
            .map(|tag| tag.as_str().to_ascii_uppercase())
    }
}
