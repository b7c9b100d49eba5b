//! StealthSpanner
//!
//! Concurrent VPN endpoint probing, scoring and ranking. Hosts are discovered
//! from provider `.ovpn` files, probed repeatedly over a bounded worker pool,
//! summarised into latency, jitter and loss statistics, and ranked by a
//! composite score that can blend in a per-region privacy rating.

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod hosts;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod providers;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::PrivacyConfiguration;
pub use error::{AppError, Result};
pub use executor::{run_batch, BatchOrchestrator, BatchSettings, HostProbeRunner, ProbeSettings};
pub use models::{Config, HostStatistics, JitterMetrics, ScoredResult};
pub use output::{rank, Ranking};
pub use probe::{classify, Prober, RawProbe};
pub use stats::score;
pub use types::{HostTarget, ProbeAttemptOutcome, TerminalStatus};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PROVIDER: &str = "ipvanish";
    pub const DEFAULT_ATTEMPT_COUNT: u32 = 4;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_WORKERS: usize = 20;
    pub const DEFAULT_PROBE_PORT: u16 = 443;
    pub const DEFAULT_PRIVACY_ENABLED: bool = true;
    pub const DEFAULT_PRIVACY_WEIGHT: f64 = 0.35;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_LOG_FILE: &str = "stealthspanner.log";
    pub const DEFAULT_AUTO_DOWNLOAD: bool = true;
}
