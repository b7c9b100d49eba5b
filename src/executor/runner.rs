//! Per-host probe runner
//!
//! Runs a fixed number of sequential probe attempts against one host and
//! folds them into [`HostStatistics`]. Every outcome, total failure included,
//! comes back as a statistics value; nothing is returned as an error.

use crate::{
    models::metrics::HostStatistics,
    probe::{classify, Prober},
    stats::AttemptTally,
    types::{HostTarget, ProbeAttemptOutcome},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Attempt count and per-attempt timeout for one host run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettings {
    pub attempt_count: u32,
    pub per_attempt_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            attempt_count: crate::defaults::DEFAULT_ATTEMPT_COUNT,
            per_attempt_timeout: crate::defaults::DEFAULT_TIMEOUT,
        }
    }
}

/// Result of applying zero-latency verification to one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiedAttempt {
    /// Counts toward the tally
    Counted(ProbeAttemptOutcome),
    /// Neither measured nor failed
    Discarded,
}

/// Runs probe attempts for single hosts through a shared [`Prober`]
#[derive(Clone)]
pub struct HostProbeRunner {
    prober: Arc<dyn Prober>,
    settings: ProbeSettings,
}

impl HostProbeRunner {
    pub fn new(prober: Arc<dyn Prober>, settings: ProbeSettings) -> Self {
        Self { prober, settings }
    }

    pub fn settings(&self) -> ProbeSettings {
        self.settings
    }

    /// Probe one host and reduce the attempts into statistics
    pub async fn run(&self, target: &HostTarget) -> HostStatistics {
        if let Err(error) = self.prober.resolve(&target.hostname).await {
            return HostStatistics::unresolved(error.message);
        }

        let mut tally = AttemptTally::new(self.settings.attempt_count);
        for _ in 0..self.settings.attempt_count {
            match self.attempt(&target.hostname).await {
                VerifiedAttempt::Counted(outcome) => tally.record(outcome),
                VerifiedAttempt::Discarded => tally.discard(),
            }
        }

        tally.finish()
    }

    /// One classified attempt with zero-latency verification applied
    pub async fn attempt(&self, hostname: &str) -> VerifiedAttempt {
        let timeout = self.settings.per_attempt_timeout;
        let outcome = classify(self.prober.probe(hostname, timeout).await);

        match outcome {
            ProbeAttemptOutcome::Measured(value) if value == 0.0 => {
                let verification = classify(self.prober.probe(hostname, timeout).await);
                verify_zero(verification)
            }
            other => VerifiedAttempt::Counted(other),
        }
    }
}

/// Decide what a 0.0 ms attempt is worth given its verification probe.
///
/// Only a second 0.0 or a positive follow-up is trusted; a failed follow-up
/// discards the attempt.
pub fn verify_zero(verification: ProbeAttemptOutcome) -> VerifiedAttempt {
    match verification {
        ProbeAttemptOutcome::Measured(value) => VerifiedAttempt::Counted(ProbeAttemptOutcome::Measured(value)),
        _ => VerifiedAttempt::Discarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, RawProbe};
    use crate::types::TerminalStatus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of raw results
    struct ScriptedProber {
        resolves: bool,
        script: Mutex<VecDeque<RawProbe>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProber {
        fn new(script: Vec<RawProbe>) -> Self {
            Self {
                resolves: true,
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn unresolvable() -> Self {
            Self { resolves: false, ..Self::new(Vec::new()) }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn resolve(&self, hostname: &str) -> std::result::Result<(), ProbeError> {
            if self.resolves {
                Ok(())
            } else {
                Err(ProbeError::host_unknown(format!("Cannot resolve {}", hostname)))
            }
        }

        async fn probe(&self, _hostname: &str, _timeout: Duration) -> RawProbe {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RawProbe::Failed(ProbeError::timeout("script exhausted")))
        }
    }

    fn runner(prober: Arc<ScriptedProber>, attempts: u32) -> HostProbeRunner {
        HostProbeRunner::new(
            prober,
            ProbeSettings {
                attempt_count: attempts,
                per_attempt_timeout: Duration::from_millis(50),
            },
        )
    }

    fn target() -> HostTarget {
        HostTarget::new("a.ovpn", "h1", Some("CH".to_string()))
    }

    fn timeout() -> RawProbe {
        RawProbe::Failed(ProbeError::timeout("Request timed out"))
    }

    #[tokio::test]
    async fn test_all_measured() {
        let prober = Arc::new(ScriptedProber::new(vec![
            RawProbe::Measured(10.0),
            RawProbe::Measured(12.0),
            RawProbe::Measured(11.0),
            RawProbe::Measured(13.0),
        ]));

        let stats = runner(prober.clone(), 4).run(&target()).await;

        assert_eq!(stats.terminal_status, TerminalStatus::Success);
        assert_eq!(stats.loss_fraction, 0.0);
        assert!((stats.mean_latency_ms.unwrap() - 11.5).abs() < 1e-9);
        assert!(stats.jitter.is_some());
        assert_eq!(prober.calls(), 4);
    }

    #[tokio::test]
    async fn test_unresolvable_short_circuits() {
        let prober = Arc::new(ScriptedProber::unresolvable());
        let stats = runner(prober.clone(), 4).run(&target()).await;

        assert_eq!(stats.terminal_status, TerminalStatus::NameResolutionFailed);
        assert_eq!(stats.loss_fraction, 1.0);
        assert!(stats.mean_latency_ms.is_none());
        assert!(stats.jitter.is_none());
        assert_eq!(prober.calls(), 0);
    }

    #[tokio::test]
    async fn test_one_success_three_timeouts() {
        let prober = Arc::new(ScriptedProber::new(vec![
            RawProbe::Measured(30.0),
            timeout(),
            timeout(),
            timeout(),
        ]));

        let stats = runner(prober, 4).run(&target()).await;
        assert_eq!(stats.loss_fraction, 0.75);
        assert_eq!(stats.terminal_status, TerminalStatus::Success);
        assert!(stats.jitter.is_none());
    }

    #[tokio::test]
    async fn test_zero_confirmed_by_zero() {
        let prober = Arc::new(ScriptedProber::new(vec![RawProbe::Measured(0.0), RawProbe::Measured(0.0)]));
        let attempt = runner(prober.clone(), 1).attempt("h1").await;

        assert_eq!(attempt, VerifiedAttempt::Counted(ProbeAttemptOutcome::Measured(0.0)));
        assert_eq!(prober.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_replaced_by_follow_up() {
        let prober = Arc::new(ScriptedProber::new(vec![RawProbe::Measured(0.0), RawProbe::Measured(5.0)]));
        let attempt = runner(prober, 1).attempt("h1").await;

        assert_eq!(attempt, VerifiedAttempt::Counted(ProbeAttemptOutcome::Measured(5.0)));
    }

    #[tokio::test]
    async fn test_zero_discarded_on_failed_follow_up() {
        let prober = Arc::new(ScriptedProber::new(vec![RawProbe::Measured(0.0), timeout()]));
        let attempt = runner(prober, 1).attempt("h1").await;

        assert_eq!(attempt, VerifiedAttempt::Discarded);
    }

    #[tokio::test]
    async fn test_discarded_attempt_in_full_run() {
        let prober = Arc::new(ScriptedProber::new(vec![
            RawProbe::Measured(0.0),
            timeout(),
            RawProbe::Measured(20.0),
            RawProbe::Measured(22.0),
        ]));

        let stats = runner(prober.clone(), 3).run(&target()).await;

        // Discard is neither a timeout nor a measurement, so status stays Success
        assert_eq!(stats.terminal_status, TerminalStatus::Success);
        assert_eq!(stats.samples, vec![20.0, 22.0]);
        assert!((stats.loss_fraction - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(prober.calls(), 4);
    }

    #[tokio::test]
    async fn test_only_discards_is_other_failure() {
        let prober = Arc::new(ScriptedProber::new(vec![
            RawProbe::Measured(0.0),
            RawProbe::Failed(ProbeError::other("reset")),
        ]));

        let stats = runner(prober, 1).run(&target()).await;
        assert_eq!(stats.terminal_status, TerminalStatus::OtherFailure);
        assert_eq!(stats.loss_fraction, 1.0);
    }

    #[tokio::test]
    async fn test_dns_failures_during_attempts() {
        let prober = Arc::new(ScriptedProber::new(vec![
            RawProbe::Failed(ProbeError::other("ping: cannot resolve h1: Unknown host")),
            RawProbe::Failed(ProbeError::other("ping: cannot resolve h1: Unknown host")),
        ]));

        let stats = runner(prober, 2).run(&target()).await;
        assert_eq!(stats.terminal_status, TerminalStatus::NameResolutionFailed);
    }

    #[test]
    fn test_verify_zero_rules() {
        assert_eq!(
            verify_zero(ProbeAttemptOutcome::Measured(7.5)),
            VerifiedAttempt::Counted(ProbeAttemptOutcome::Measured(7.5))
        );
        assert_eq!(verify_zero(ProbeAttemptOutcome::TimedOut), VerifiedAttempt::Discarded);
        assert_eq!(
            verify_zero(ProbeAttemptOutcome::OtherFailure("x".to_string())),
            VerifiedAttempt::Discarded
        );
    }
}
