//! Performance benchmarks for StealthSpanner
//!
//! Covers the pure hot paths (statistics, scoring, ranking, report
//! rendering) and a full batch over an in-memory prober.

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stealthspanner::{
    config::PrivacyConfiguration,
    hosts::parse_remote_host,
    models::{HostStatistics, ScoredResult},
    output::{rank, PlainFormatter, ReportFormatter},
    probe::{ProbeError, Prober, RawProbe},
    run_batch,
    stats::{jitter, AttemptTally},
    types::{HostTarget, ProbeAttemptOutcome},
    BatchSettings, ProbeSettings,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

/// Answers instantly with a latency derived from the hostname length
struct InstantProber;

#[async_trait]
impl Prober for InstantProber {
    async fn resolve(&self, _hostname: &str) -> Result<(), ProbeError> {
        Ok(())
    }

    async fn probe(&self, hostname: &str, _timeout: Duration) -> RawProbe {
        RawProbe::Measured(5.0 + hostname.len() as f64)
    }
}

fn sample_latencies(count: usize) -> Vec<f64> {
    (0..count).map(|i| 20.0 + (i % 17) as f64 * 1.5).collect()
}

fn sample_results(count: usize) -> Vec<ScoredResult> {
    let privacy = PrivacyConfiguration::default();
    let regions = ["CH", "US", "NL", "SE", "RO"];

    (0..count)
        .map(|i| {
            let region = regions[i % regions.len()];
            let target = HostTarget::new(
                format!("ipvanish-{}-city-h{:03}.ovpn", region, i),
                format!("h{:03}.ipvanish.com", i),
                Some(region.to_string()),
            );

            let statistics = if i % 10 == 0 {
                HostStatistics::unresolved("no record found")
            } else {
                let mut tally = AttemptTally::new(4);
                for sample in sample_latencies(4 + i % 3).into_iter().take(4) {
                    tally.record(ProbeAttemptOutcome::Measured(sample + i as f64));
                }
                tally.finish()
            };

            let rating = privacy.applicable_rating(target.region_tag.as_deref());
            let composite = stealthspanner::score(&statistics, rating, &privacy);
            ScoredResult::new(target, statistics, rating, composite)
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [4usize, 20, 100] {
        let samples = sample_latencies(size);
        group.bench_with_input(BenchmarkId::new("jitter", size), &samples, |b, samples| {
            b.iter(|| jitter(black_box(samples)))
        });
    }

    group.bench_function("tally_finish", |b| {
        b.iter(|| {
            let mut tally = AttemptTally::new(10);
            for sample in sample_latencies(8) {
                tally.record(ProbeAttemptOutcome::Measured(sample));
            }
            tally.record(ProbeAttemptOutcome::TimedOut);
            tally.discard();
            black_box(tally.finish())
        })
    });

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let privacy = PrivacyConfiguration::default();
    let mut tally = AttemptTally::new(4);
    for sample in [10.0, 12.0, 11.0, 13.0] {
        tally.record(ProbeAttemptOutcome::Measured(sample));
    }
    let statistics = tally.finish();

    c.bench_function("score", |b| {
        b.iter(|| stealthspanner::score(black_box(&statistics), black_box(Some(100)), &privacy))
    });
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for size in [50usize, 500] {
        let results = sample_results(size);
        group.bench_with_input(BenchmarkId::new("rank", size), &results, |b, results| {
            b.iter(|| rank(black_box(results.clone())))
        });
    }

    let ranking = rank(sample_results(200));
    group.bench_function("plain_report_200", |b| {
        b.iter(|| PlainFormatter::new().format_report(black_box(&ranking)))
    });

    group.finish();
}

fn bench_discovery_parsing(c: &mut Criterion) {
    let content = "client\ndev tun\nproto udp\nremote-cert-tls server\nremote zrh-c18.ipvanish.com 443\nresolv-retry infinite\n";
    c.bench_function("parse_remote_host", |b| b.iter(|| parse_remote_host(black_box(content))));
}

fn bench_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let targets: Vec<HostTarget> = (0..100)
        .map(|i| HostTarget::new(format!("h{}.ovpn", i), format!("h{}.example", i), None))
        .collect();
    let settings = BatchSettings {
        probe: ProbeSettings {
            attempt_count: 4,
            per_attempt_timeout: Duration::from_millis(100),
        },
        max_concurrency: 20,
    };

    c.bench_function("batch_100_hosts", |b| {
        b.iter(|| {
            runtime.block_on(run_batch(
                Arc::new(InstantProber),
                targets.clone(),
                settings,
                PrivacyConfiguration::default(),
                |_, _| {},
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_statistics,
    bench_scoring,
    bench_ranking,
    bench_discovery_parsing,
    bench_batch
);
criterion_main!(benches);
