//! Batch execution engine
//!
//! This module contains the concurrent probing components:
//! - [`runner::HostProbeRunner`] probes a single host
//! - [`BatchOrchestrator`] fans runners out over a bounded worker pool,
//!   scores each host and collects results in completion order

pub mod runner;

pub use runner::{HostProbeRunner, ProbeSettings, VerifiedAttempt};

use crate::{
    config::privacy::PrivacyConfiguration,
    error::{AppError, Result},
    logging::BatchLogger,
    models::{metrics::ScoredResult, Config},
    probe::Prober,
    stats::score,
    types::HostTarget,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

/// Worker pool and per-host probe settings for one batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    pub probe: ProbeSettings,
    /// Maximum number of hosts probed at the same time
    pub max_concurrency: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            probe: ProbeSettings::default(),
            max_concurrency: crate::defaults::DEFAULT_WORKERS,
        }
    }
}

impl From<&Config> for BatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            probe: ProbeSettings {
                attempt_count: config.ping_count,
                per_attempt_timeout: config.timeout(),
            },
            max_concurrency: config.workers,
        }
    }
}

/// Summary of a finished batch, for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_hosts: usize,
    pub responded: usize,
    pub degraded: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[ScoredResult], degraded: usize, elapsed: Duration) -> Self {
        Self {
            total_hosts: results.len(),
            responded: results.iter().filter(|r| r.responded()).count(),
            degraded,
            elapsed,
        }
    }
}

/// Runs one probe task per host over a bounded worker pool
pub struct BatchOrchestrator {
    runner: HostProbeRunner,
    privacy: Arc<PrivacyConfiguration>,
    max_concurrency: usize,
    logger: Option<BatchLogger>,
}

impl BatchOrchestrator {
    pub fn new(prober: Arc<dyn Prober>, settings: BatchSettings, privacy: PrivacyConfiguration) -> Self {
        Self {
            runner: HostProbeRunner::new(prober, settings.probe),
            privacy: Arc::new(privacy),
            max_concurrency: settings.max_concurrency,
            logger: None,
        }
    }

    /// Attach a logger for per-host debug records and the batch summary
    pub fn with_logger(mut self, logger: BatchLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Probe and score every target.
    ///
    /// Results come back in completion order. `progress` is called once per
    /// finished host with `(completed, total)`, always from this task, so it
    /// never runs concurrently with itself. Fails only for an empty target
    /// list, a zero-sized pool or zero attempts per host; a host task that panics is recorded as a
    /// degraded `OtherFailure` result and the batch carries on.
    pub async fn run_batch<F>(&self, targets: Vec<HostTarget>, mut progress: F) -> Result<Vec<ScoredResult>>
    where
        F: FnMut(usize, usize),
    {
        if targets.is_empty() {
            return Err(AppError::execution("No hosts to probe"));
        }
        if self.max_concurrency == 0 {
            return Err(AppError::execution("Worker pool size must be at least 1"));
        }
        if self.runner.settings().attempt_count == 0 {
            return Err(AppError::execution("Attempt count must be at least 1"));
        }

        let started = Instant::now();
        let total = targets.len();
        let correlation_id = match &self.logger {
            Some(logger) => Some(
                logger
                    .log_batch_start(total, self.max_concurrency, self.runner.settings().attempt_count)
                    .await,
            ),
            None => None,
        };
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (result_sender, mut result_receiver) = mpsc::channel::<TaskOutput>(total);

        let mut tasks = Vec::with_capacity(total);
        for target in targets {
            let runner = self.runner.clone();
            let privacy = self.privacy.clone();
            let semaphore = semaphore.clone();
            let sender = result_sender.clone();

            let task = tokio::spawn(async move {
                let output = match semaphore.acquire_owned().await {
                    Ok(_permit) => probe_isolated(runner, privacy, target).await,
                    Err(e) => TaskOutput::degraded(target, format!("Worker pool closed: {}", e)),
                };
                let _ = sender.send(output).await;
            });

            tasks.push(task);
        }

        // Drop the original sender so the channel closes when all tasks finish
        drop(result_sender);

        let mut results = Vec::with_capacity(total);
        let mut degraded = 0;
        while let Some(output) = result_receiver.recv().await {
            results.push(output.result);
            let completed = results.len();
            progress(completed, total);

            if let (Some(logger), Some(result)) = (&self.logger, results.last()) {
                if output.degraded {
                    logger.log_host_defect(result).await;
                } else {
                    logger.log_host_completed(result, completed, total).await;
                }
            }
            if output.degraded {
                degraded += 1;
            }
        }

        // Wait for all tasks to complete
        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                // Only reachable if sending itself panicked; the result is already lost
                return Err(AppError::internal(format!("Batch task aborted: {}", e)));
            }
        }

        if results.len() != total {
            return Err(AppError::internal(format!(
                "Collected {} results for {} hosts",
                results.len(),
                total
            )));
        }

        if let (Some(logger), Some(correlation_id)) = (&self.logger, &correlation_id) {
            let summary = BatchSummary::from_results(&results, degraded, started.elapsed());
            logger.log_batch_summary(correlation_id, &summary).await;
        }

        Ok(results)
    }
}

/// Convenience wrapper building an orchestrator for a single batch
pub async fn run_batch<F>(
    prober: Arc<dyn Prober>,
    targets: Vec<HostTarget>,
    settings: BatchSettings,
    privacy: PrivacyConfiguration,
    progress: F,
) -> Result<Vec<ScoredResult>>
where
    F: FnMut(usize, usize),
{
    BatchOrchestrator::new(prober, settings, privacy)
        .run_batch(targets, progress)
        .await
}

struct TaskOutput {
    result: ScoredResult,
    degraded: bool,
}

impl TaskOutput {
    fn degraded(target: HostTarget, message: String) -> Self {
        Self { result: ScoredResult::degraded(target, message), degraded: true }
    }
}

/// Run and score one host on its own task so a panic stays contained
async fn probe_isolated(
    runner: HostProbeRunner,
    privacy: Arc<PrivacyConfiguration>,
    target: HostTarget,
) -> TaskOutput {
    let task_target = target.clone();
    let handle = tokio::spawn(async move {
        let statistics = runner.run(&task_target).await;
        let region_rating = privacy.applicable_rating(task_target.region_tag.as_deref());
        let composite_score = score(&statistics, region_rating, &privacy);
        ScoredResult::new(task_target, statistics, region_rating, composite_score)
    });

    match handle.await {
        Ok(result) => TaskOutput { result, degraded: false },
        Err(e) => TaskOutput::degraded(target, format!("Host task panicked: {}", e)),
    }
}
