//! Command-line interface

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

/// StealthSpanner - rank VPN endpoints by latency, jitter, packet loss and privacy
#[derive(Parser, Debug, Clone)]
#[command(name = "stealthspanner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of probe attempts per host [default: 4]
    #[arg(short = 'n', long = "pings", value_name = "N", value_parser = parse_ping_count)]
    pub pings: Option<u32>,

    /// Number of hosts probed concurrently [default: 20]
    #[arg(short, long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Per-attempt timeout in seconds [default: 3.0]
    #[arg(short, long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<f64>,

    /// Directory containing .ovpn host definition files
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// VPN provider whose naming rules apply [default: ipvanish]
    #[arg(short, long, value_name = "NAME")]
    pub provider: Option<String>,

    /// TCP port used for round-trip probes [default: 443]
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Rank purely on network quality, ignoring region privacy ratings
    #[arg(long)]
    pub no_privacy: bool,

    /// Share of the score given to the privacy rating (0.0 - 1.0)
    #[arg(long, value_name = "W", value_parser = parse_weight)]
    pub privacy_weight: Option<f64>,

    /// File the plain-text report is written to
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Skip refreshing the config directory from the provider
    #[arg(long)]
    pub no_download: bool,

    /// Provider listing the config archive is downloaded from
    #[arg(long, value_name = "URL")]
    pub download_url: Option<String>,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Check if colors should be enabled, given the configured preference
    pub fn use_colors(&self, configured: bool) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            configured && supports_color()
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line overrides:\n");
        if let Some(pings) = self.pings {
            summary.push_str(&format!("  Pings: {}\n", pings));
        }
        if let Some(workers) = self.workers {
            summary.push_str(&format!("  Workers: {}\n", workers));
        }
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Timeout: {}s\n", timeout));
        }
        if let Some(ref directory) = self.directory {
            summary.push_str(&format!("  Directory: {}\n", directory.display()));
        }
        if let Some(ref provider) = self.provider {
            summary.push_str(&format!("  Provider: {}\n", provider));
        }
        if self.no_privacy {
            summary.push_str("  Privacy weighting: disabled\n");
        }
        if let Some(weight) = self.privacy_weight {
            summary.push_str(&format!("  Privacy weight: {}\n", weight));
        }
        if self.no_download {
            summary.push_str("  Download: skipped\n");
        }

        summary
    }
}

fn parse_ping_count(s: &str) -> Result<u32, String> {
    let count = s.parse::<u32>().map_err(|_| format!("Invalid ping count: {}", s))?;
    match count {
        0 => Err("Ping count must be greater than 0".to_string()),
        c if c > 100 => Err("Ping count cannot exceed 100".to_string()),
        c => Ok(c),
    }
}

fn parse_workers(s: &str) -> Result<usize, String> {
    let workers = s.parse::<usize>().map_err(|_| format!("Invalid worker count: {}", s))?;
    match workers {
        0 => Err("Worker count must be greater than 0".to_string()),
        w if w > 512 => Err("Worker count cannot exceed 512".to_string()),
        w => Ok(w),
    }
}

/// Parse timeout from seconds string
fn parse_timeout(s: &str) -> Result<f64, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid timeout: {}", s));
    }

    let secs = s.parse::<f64>().map_err(|_| format!("Invalid timeout: {}", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        Err("Timeout must be greater than 0".to_string())
    } else if secs > 60.0 {
        Err("Timeout cannot exceed 60 seconds".to_string())
    } else {
        Ok(secs)
    }
}

fn parse_weight(s: &str) -> Result<f64, String> {
    let weight = s.parse::<f64>().map_err(|_| format!("Invalid privacy weight: {}", s))?;
    if (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err("Privacy weight must be between 0.0 and 1.0".to_string())
    }
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    std::io::stdout().is_terminal()
}
