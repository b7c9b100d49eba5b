//! Probe primitive abstraction and attempt classification
//!
//! The engine never talks to the network directly. It drives a [`Prober`],
//! which resolves hostnames and performs single round-trip measurements, and
//! turns each raw result into a [`ProbeAttemptOutcome`] with [`classify`].

pub mod tcp;

pub use tcp::TcpProber;

use crate::types::ProbeAttemptOutcome;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Error message fragments that identify a name-resolution failure.
/// Matched case-insensitively against the reported message.
pub const NAME_RESOLUTION_MARKERS: &[&str] = &[
    "cannot resolve",
    "unknown host",
    "name or service not known",
    "nodename nor servname provided",
    "no record found",
    "failed to lookup address",
];

/// Error message fragments that identify a timeout.
const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout"];

/// What the primitive itself reports about a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// The primitive knows the host name did not resolve
    HostUnknown,
    /// The primitive gave up waiting for a reply
    Timeout,
    /// Anything else; the message decides the classification
    Other,
}

/// Failure reported by a probe primitive
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub message: String,
}

impl ProbeError {
    pub fn host_unknown<S: Into<String>>(message: S) -> Self {
        Self { kind: ProbeErrorKind::HostUnknown, message: message.into() }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self { kind: ProbeErrorKind::Timeout, message: message.into() }
    }

    pub fn other<S: Into<String>>(message: S) -> Self {
        Self { kind: ProbeErrorKind::Other, message: message.into() }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProbeError {}

/// Raw result of one probe attempt, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum RawProbe {
    /// Round trip in milliseconds as reported by the primitive
    Measured(f64),
    /// The primitive reported an error condition
    Failed(ProbeError),
}

/// Reachability probing capability.
///
/// Implementations must be safe to share across the worker pool. Every method
/// reports failures as values; neither is expected to panic.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Resolve `hostname` once before any attempt is made
    async fn resolve(&self, hostname: &str) -> std::result::Result<(), ProbeError>;

    /// Perform one round-trip measurement bounded by `timeout`
    async fn probe(&self, hostname: &str, timeout: Duration) -> RawProbe;
}

/// Classify one raw attempt into exactly one outcome.
///
/// Name-resolution markers take precedence over timeout signals; negative
/// measurements are rejected as failures.
pub fn classify(raw: RawProbe) -> ProbeAttemptOutcome {
    match raw {
        RawProbe::Measured(value) if value >= 0.0 && value.is_finite() => {
            ProbeAttemptOutcome::Measured(value)
        }
        RawProbe::Measured(value) => {
            ProbeAttemptOutcome::OtherFailure(format!("invalid measurement: {} ms", value))
        }
        RawProbe::Failed(error) => classify_error(error),
    }
}

fn classify_error(error: ProbeError) -> ProbeAttemptOutcome {
    let lowered = error.message.to_lowercase();

    if error.kind == ProbeErrorKind::HostUnknown || is_name_resolution_message(&lowered) {
        return ProbeAttemptOutcome::NameResolutionFailed;
    }

    if error.kind == ProbeErrorKind::Timeout || TIMEOUT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ProbeAttemptOutcome::TimedOut;
    }

    ProbeAttemptOutcome::OtherFailure(error.message)
}

/// Whether a (lower-cased) message reads as a name-resolution failure
pub fn is_name_resolution_message(lowered: &str) -> bool {
    NAME_RESOLUTION_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_values_pass_through() {
        assert_eq!(classify(RawProbe::Measured(12.5)), ProbeAttemptOutcome::Measured(12.5));
        assert_eq!(classify(RawProbe::Measured(0.0)), ProbeAttemptOutcome::Measured(0.0));
    }

    #[test]
    fn test_negative_measurement_is_failure() {
        assert!(matches!(
            classify(RawProbe::Measured(-1.0)),
            ProbeAttemptOutcome::OtherFailure(_)
        ));
        assert!(matches!(
            classify(RawProbe::Measured(f64::NAN)),
            ProbeAttemptOutcome::OtherFailure(_)
        ));
    }

    #[test]
    fn test_name_resolution_markers_case_insensitive() {
        for message in [
            "Cannot resolve: Unknown host example.invalid",
            "UNKNOWN HOST",
            "getaddrinfo: Name or service not known",
            "nodename nor servname provided, or not known",
        ] {
            assert_eq!(
                classify(RawProbe::Failed(ProbeError::other(message))),
                ProbeAttemptOutcome::NameResolutionFailed,
                "message: {}",
                message
            );
        }
    }

    #[test]
    fn test_host_unknown_kind_wins() {
        let raw = RawProbe::Failed(ProbeError::host_unknown("lookup failed"));
        assert_eq!(classify(raw), ProbeAttemptOutcome::NameResolutionFailed);
    }

    #[test]
    fn test_resolution_marker_beats_timeout_kind() {
        let raw = RawProbe::Failed(ProbeError::timeout("cannot resolve host"));
        assert_eq!(classify(raw), ProbeAttemptOutcome::NameResolutionFailed);
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(
            classify(RawProbe::Failed(ProbeError::timeout("no reply"))),
            ProbeAttemptOutcome::TimedOut
        );
        assert_eq!(
            classify(RawProbe::Failed(ProbeError::other("Request Timed Out after 3s"))),
            ProbeAttemptOutcome::TimedOut
        );
    }

    #[test]
    fn test_other_failures_keep_message() {
        let raw = RawProbe::Failed(ProbeError::other("network is unreachable"));
        assert_eq!(
            classify(raw),
            ProbeAttemptOutcome::OtherFailure("network is unreachable".to_string())
        );
    }
}
