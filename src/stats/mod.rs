//! Reduction of probe attempts into per-host statistics

pub mod scoring;

pub use scoring::{score, round2};

use crate::{
    models::metrics::{HostStatistics, JitterMetrics},
    types::{ProbeAttemptOutcome, TerminalStatus},
};

/// Running tally of one host's classified attempts.
///
/// `attempt_count` is fixed up front; the loss fraction is always computed
/// against it, so a discarded attempt still counts as lost.
#[derive(Debug, Clone)]
pub struct AttemptTally {
    attempt_count: u32,
    measured: Vec<f64>,
    resolution_failures: u32,
    timeouts: u32,
    other_failures: u32,
    discarded: u32,
    last_error: Option<String>,
}

impl AttemptTally {
    pub fn new(attempt_count: u32) -> Self {
        Self {
            attempt_count,
            measured: Vec::with_capacity(attempt_count as usize),
            resolution_failures: 0,
            timeouts: 0,
            other_failures: 0,
            discarded: 0,
            last_error: None,
        }
    }

    /// Record one classified attempt
    pub fn record(&mut self, outcome: ProbeAttemptOutcome) {
        match outcome {
            ProbeAttemptOutcome::Measured(value) => self.measured.push(value),
            ProbeAttemptOutcome::NameResolutionFailed => {
                self.resolution_failures += 1;
                self.last_error = Some("Name resolution failed".to_string());
            }
            ProbeAttemptOutcome::TimedOut => {
                self.timeouts += 1;
                self.last_error = Some("Request timed out".to_string());
            }
            ProbeAttemptOutcome::OtherFailure(message) => {
                self.other_failures += 1;
                self.last_error = Some(message);
            }
        }
    }

    /// Drop an attempt without counting it as measured or failed
    pub fn discard(&mut self) {
        self.discarded += 1;
    }

    pub fn measured(&self) -> &[f64] {
        &self.measured
    }

    pub fn resolution_failures(&self) -> u32 {
        self.resolution_failures
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Terminal status; DNS-only failure wins, then any timeout, then any DNS failure
    pub fn terminal_status(&self) -> TerminalStatus {
        if !self.measured.is_empty() {
            TerminalStatus::Success
        } else if self.resolution_failures == self.attempt_count {
            TerminalStatus::NameResolutionFailed
        } else if self.timeouts > 0 {
            TerminalStatus::TimedOut
        } else if self.resolution_failures > 0 {
            TerminalStatus::NameResolutionFailed
        } else {
            TerminalStatus::OtherFailure
        }
    }

    pub fn loss_fraction(&self) -> f64 {
        if self.attempt_count == 0 {
            return 1.0;
        }
        let accepted = self.measured.len().min(self.attempt_count as usize) as f64;
        let total = self.attempt_count as f64;
        ((total - accepted) / total).clamp(0.0, 1.0)
    }

    /// Freeze the tally into immutable statistics
    pub fn finish(self) -> HostStatistics {
        let terminal_status = self.terminal_status();
        let loss_fraction = self.loss_fraction();

        HostStatistics {
            mean_latency_ms: mean(&self.measured),
            jitter: jitter(&self.measured),
            loss_fraction,
            terminal_status,
            last_error: if terminal_status.is_success() { None } else { self.last_error },
            samples: self.measured,
        }
    }
}

/// Arithmetic mean, `None` for no samples
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Spread of the samples; requires at least two of them
pub fn jitter(samples: &[f64]) -> Option<JitterMetrics> {
    if samples.len() < 2 {
        return None;
    }

    let avg = mean(samples)?;
    let n = samples.len() as f64;

    let variance = samples.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;
    let mean_abs_dev = samples.iter().map(|v| (v - avg).abs()).sum::<f64>() / n;

    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);

    Some(JitterMetrics {
        std_dev: variance.sqrt(),
        mean_abs_dev,
        range: max - min,
    })
}
