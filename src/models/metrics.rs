//! Per-host statistics and scored result data models

use crate::types::{HostTarget, TerminalStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spread of accepted latency samples, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterMetrics {
    /// Population standard deviation
    pub std_dev: f64,
    /// Mean absolute deviation from the mean
    pub mean_abs_dev: f64,
    /// Difference between the largest and smallest sample
    pub range: f64,
}

/// Aggregate outcome of one host's probe run.
///
/// `mean_latency_ms` is `None` exactly when no attempt was accepted, and
/// `terminal_status` is `Success` exactly when it is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStatistics {
    pub mean_latency_ms: Option<f64>,
    /// Present only with two or more accepted samples
    pub jitter: Option<JitterMetrics>,
    /// Fraction of attempts without an accepted measurement, in `[0, 1]`
    pub loss_fraction: f64,
    pub terminal_status: TerminalStatus,
    /// Accepted samples in attempt order
    #[serde(default)]
    pub samples: Vec<f64>,
    /// Last failure message seen during the run, if any
    #[serde(default)]
    pub last_error: Option<String>,
}

impl HostStatistics {
    /// Statistics for a host whose name never resolved
    pub fn unresolved<S: Into<String>>(message: S) -> Self {
        Self::unreachable(TerminalStatus::NameResolutionFailed, Some(message.into()))
    }

    /// Statistics for a host that produced no accepted measurement
    pub fn unreachable(status: TerminalStatus, last_error: Option<String>) -> Self {
        Self {
            mean_latency_ms: None,
            jitter: None,
            loss_fraction: 1.0,
            terminal_status: status,
            samples: Vec::new(),
            last_error,
        }
    }

    /// Whether the host answered at least once
    pub fn responded(&self) -> bool {
        self.mean_latency_ms.is_some()
    }

    pub fn jitter_std_dev(&self) -> Option<f64> {
        self.jitter.map(|j| j.std_dev)
    }

    pub fn loss_percent(&self) -> f64 {
        self.loss_fraction * 100.0
    }
}

/// One host's statistics, region rating and composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub target: HostTarget,
    pub statistics: HostStatistics,
    /// Privacy rating applied to the score; `None` when no rating applies
    pub region_rating: Option<u8>,
    /// Composite score in `[0, 100]`, rounded to two decimals
    pub composite_score: f64,
    pub completed_at: DateTime<Utc>,
}

impl ScoredResult {
    pub fn new(
        target: HostTarget,
        statistics: HostStatistics,
        region_rating: Option<u8>,
        composite_score: f64,
    ) -> Self {
        Self {
            target,
            statistics,
            region_rating,
            composite_score,
            completed_at: Utc::now(),
        }
    }

    /// Degraded record for a task that failed outside normal probe outcomes
    pub fn degraded<S: Into<String>>(target: HostTarget, message: S) -> Self {
        Self::new(
            target,
            HostStatistics::unreachable(TerminalStatus::OtherFailure, Some(message.into())),
            None,
            0.0,
        )
    }

    pub fn id(&self) -> &str {
        &self.target.id
    }

    pub fn hostname(&self) -> &str {
        &self.target.hostname
    }

    pub fn status(&self) -> TerminalStatus {
        self.statistics.terminal_status
    }

    pub fn responded(&self) -> bool {
        self.statistics.responded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_statistics() {
        let stats = HostStatistics::unresolved("Cannot resolve vpn.invalid");

        assert!(!stats.responded());
        assert_eq!(stats.loss_fraction, 1.0);
        assert_eq!(stats.terminal_status, TerminalStatus::NameResolutionFailed);
        assert!(stats.jitter.is_none());
        assert_eq!(stats.loss_percent(), 100.0);
    }

    #[test]
    fn test_degraded_result() {
        let target = HostTarget::new("a.ovpn", "h1", Some("CH".to_string()));
        let result = ScoredResult::degraded(target, "task panicked");

        assert_eq!(result.id(), "a.ovpn");
        assert_eq!(result.status(), TerminalStatus::OtherFailure);
        assert_eq!(result.composite_score, 0.0);
        assert_eq!(result.region_rating, None);
        assert_eq!(result.statistics.last_error.as_deref(), Some("task panicked"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let stats = HostStatistics {
            mean_latency_ms: Some(11.5),
            jitter: Some(JitterMetrics { std_dev: 1.118, mean_abs_dev: 1.0, range: 3.0 }),
            loss_fraction: 0.0,
            terminal_status: TerminalStatus::Success,
            samples: vec![10.0, 12.0, 11.0, 13.0],
            last_error: None,
        };

        let json = serde_json::to_string(&stats).unwrap();
        let parsed: HostStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats);
    }
}
