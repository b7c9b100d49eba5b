//! Type definitions shared across the probing engine

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// One host to probe, as supplied by the host discovery collaborator.
///
/// `id` is expected to be unique per batch; the orchestrator does not enforce
/// it and duplicate ids simply produce independent result records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostTarget {
    /// Caller-chosen identifier (the host definition file name)
    pub id: String,
    /// Hostname or IP literal to probe
    pub hostname: String,
    /// Optional two-letter region tag used for the privacy rating
    pub region_tag: Option<String>,
}

impl HostTarget {
    /// Create a new host target
    pub fn new<I, H>(id: I, hostname: H, region_tag: Option<String>) -> Self
    where
        I: Into<String>,
        H: Into<String>,
    {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            region_tag,
        }
    }
}

/// Classification of a single probe attempt.
///
/// Created per attempt and consumed immediately by the runner's tally.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeAttemptOutcome {
    /// Round trip measured, in milliseconds (never negative)
    Measured(f64),
    /// The hostname could not be resolved
    NameResolutionFailed,
    /// No reply within the per-attempt timeout
    TimedOut,
    /// Any other failure, with the reported message
    OtherFailure(String),
}

impl ProbeAttemptOutcome {
    /// Measured value, if this attempt produced one
    pub fn measured(&self) -> Option<f64> {
        match self {
            Self::Measured(value) => Some(*value),
            _ => None,
        }
    }
}

/// Final classification of a host's probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// At least one attempt produced an accepted measurement
    Success,
    /// No measurement and at least one attempt timed out
    TimedOut,
    /// The hostname could not be resolved
    NameResolutionFailed,
    /// No measurement for any other reason
    OtherFailure,
}

impl TerminalStatus {
    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::TimedOut => "Timeout/Unreachable",
            Self::NameResolutionFailed => "DNS Resolution Failed",
            Self::OtherFailure => "Failed",
        }
    }

    /// Whether this status means the host answered
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether this status is a name-resolution failure
    pub fn is_dns_failure(&self) -> bool {
        matches!(self, Self::NameResolutionFailed)
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(TerminalStatus::Success.to_string(), "Success");
        assert_eq!(TerminalStatus::NameResolutionFailed.label(), "DNS Resolution Failed");
        assert!(TerminalStatus::NameResolutionFailed.is_dns_failure());
        assert!(!TerminalStatus::TimedOut.is_success());
    }

    #[test]
    fn test_measured_accessor() {
        assert_eq!(ProbeAttemptOutcome::Measured(4.5).measured(), Some(4.5));
        assert_eq!(ProbeAttemptOutcome::TimedOut.measured(), None);
    }
}
