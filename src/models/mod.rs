//! Data models and structures for the probing engine

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{HostStatistics, JitterMetrics, ScoredResult};
