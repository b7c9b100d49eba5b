//! Composite score calculation
//!
//! The region rating takes a fixed `weight` share of the score when privacy
//! weighting is on. The remaining share always splits 40/30/30 between
//! latency, jitter and loss.

use crate::{config::privacy::PrivacyConfiguration, models::metrics::HostStatistics};

const LATENCY_SHARE: f64 = 0.4;
const JITTER_SHARE: f64 = 0.3;
const LOSS_SHARE: f64 = 0.3;

/// Jitter assumed when too few samples exist to measure spread
const MISSING_JITTER_MS: f64 = 100.0;

/// Score component for mean latency; reaches 0 at 500 ms
pub fn latency_component(mean_latency_ms: f64) -> f64 {
    clamp_component(100.0 - mean_latency_ms / 5.0)
}

/// Score component for jitter std-dev; reaches 0 at 50 ms
pub fn jitter_component(std_dev: Option<f64>) -> f64 {
    clamp_component(100.0 - std_dev.unwrap_or(MISSING_JITTER_MS) * 2.0)
}

pub fn loss_component(loss_fraction: f64) -> f64 {
    clamp_component(100.0 - loss_fraction * 100.0)
}

/// Composite score in `[0, 100]`, rounded to two decimals.
///
/// Hosts that never answered score 0 regardless of anything else.
pub fn score(
    stats: &HostStatistics,
    region_rating: Option<u8>,
    privacy: &PrivacyConfiguration,
) -> f64 {
    let Some(mean_latency) = stats.mean_latency_ms else {
        return 0.0;
    };

    let network = latency_component(mean_latency) * LATENCY_SHARE
        + jitter_component(stats.jitter_std_dev()) * JITTER_SHARE
        + loss_component(stats.loss_fraction) * LOSS_SHARE;

    let composite = if privacy.enabled {
        let weight = privacy.weight.clamp(0.0, 1.0);
        let privacy_value = f64::from(region_rating.unwrap_or(0).min(100));
        privacy_value * weight + network * (1.0 - weight)
    } else {
        network
    };

    round2(composite.clamp(0.0, 100.0))
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_component(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::metrics::JitterMetrics, types::TerminalStatus};

    fn stats(mean: Option<f64>, std_dev: Option<f64>, loss: f64) -> HostStatistics {
        HostStatistics {
            mean_latency_ms: mean,
            jitter: std_dev.map(|s| JitterMetrics { std_dev: s, mean_abs_dev: s, range: s * 2.0 }),
            loss_fraction: loss,
            terminal_status: if mean.is_some() {
                TerminalStatus::Success
            } else {
                TerminalStatus::TimedOut
            },
            samples: Vec::new(),
            last_error: None,
        }
    }

    #[test]
    fn test_unresponsive_scores_zero() {
        let privacy = PrivacyConfiguration::default();
        assert_eq!(score(&stats(None, None, 1.0), Some(100), &privacy), 0.0);
        assert_eq!(score(&stats(None, Some(1.0), 0.0), Some(100), &privacy), 0.0);
    }

    #[test]
    fn test_components() {
        assert_eq!(latency_component(0.0), 100.0);
        assert_eq!(latency_component(250.0), 50.0);
        assert_eq!(latency_component(900.0), 0.0);
        assert_eq!(jitter_component(None), 0.0);
        assert_eq!(jitter_component(Some(10.0)), 80.0);
        assert_eq!(loss_component(0.25), 75.0);
    }

    #[test]
    fn test_privacy_disabled_weights() {
        let privacy = PrivacyConfiguration::disabled();
        // latency 98, jitter 98, loss 100
        let value = score(&stats(Some(10.0), Some(1.0), 0.0), Some(100), &privacy);
        assert_eq!(value, round2(98.0 * 0.4 + 98.0 * 0.3 + 100.0 * 0.3));
    }

    #[test]
    fn test_privacy_enabled_weights() {
        let privacy = PrivacyConfiguration::default();
        let value = score(&stats(Some(10.0), Some(1.0), 0.0), Some(100), &privacy);
        let network = 98.0 * 0.4 + 98.0 * 0.3 + 100.0 * 0.3;
        assert_eq!(value, round2(100.0 * 0.35 + network * 0.65));
    }

    #[test]
    fn test_missing_rating_counts_as_zero() {
        let privacy = PrivacyConfiguration::default();
        let with_none = score(&stats(Some(50.0), Some(5.0), 0.0), None, &privacy);
        let with_zero = score(&stats(Some(50.0), Some(5.0), 0.0), Some(0), &privacy);
        assert_eq!(with_none, with_zero);
    }

    #[test]
    fn test_weight_zero_matches_disabled() {
        let host = stats(Some(37.0), Some(4.2), 0.25);
        let mut zero_weight = PrivacyConfiguration::default();
        zero_weight.weight = 0.0;

        assert_eq!(
            score(&host, Some(100), &zero_weight),
            score(&host, Some(100), &PrivacyConfiguration::disabled())
        );
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(0.004), 0.0);
    }
}
