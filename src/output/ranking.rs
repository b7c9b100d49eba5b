//! Result ordering and summary extrema

use crate::models::ScoredResult;

/// One end of an extremum: which host and the value it achieved
#[derive(Debug, Clone, PartialEq)]
pub struct HostExtreme {
    pub id: String,
    pub hostname: String,
    pub region_tag: Option<String>,
    pub value: f64,
}

impl HostExtreme {
    fn of(result: &ScoredResult, value: f64) -> Self {
        Self {
            id: result.target.id.clone(),
            hostname: result.target.hostname.clone(),
            region_tag: result.target.region_tag.clone(),
            value,
        }
    }
}

/// Best and worst host for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremePair {
    pub best: HostExtreme,
    pub worst: HostExtreme,
}

/// Summary extrema over responding hosts only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extremes {
    pub score: Option<ExtremePair>,
    pub latency: Option<ExtremePair>,
    /// Only hosts with jitter data take part
    pub jitter: Option<ExtremePair>,
    pub loss: Option<ExtremePair>,
    /// Only hosts with an applicable region rating take part
    pub rating: Option<ExtremePair>,
}

/// Ranked results plus their extrema
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Responding hosts by score, then unresponsive hosts in arrival order
    pub ordered: Vec<ScoredResult>,
    /// How many leading entries of `ordered` responded
    pub responded: usize,
    pub extremes: Extremes,
}

impl Ranking {
    pub fn total(&self) -> usize {
        self.ordered.len()
    }

    pub fn responding(&self) -> &[ScoredResult] {
        &self.ordered[..self.responded]
    }

    pub fn unresponsive(&self) -> &[ScoredResult] {
        &self.ordered[self.responded..]
    }

    /// Unresponsive hosts whose names did not resolve
    pub fn dns_failures(&self) -> usize {
        self.unresponsive()
            .iter()
            .filter(|r| r.status().is_dns_failure())
            .count()
    }

    pub fn other_failures(&self) -> usize {
        self.unresponsive().len() - self.dns_failures()
    }
}

/// Which direction counts as better for a metric
#[derive(Debug, Clone, Copy)]
enum Better {
    Higher,
    Lower,
}

/// Order results for reporting and compute extrema.
///
/// Sorting is stable, so equal scores keep their arrival order. Among equal
/// metric values the best is the earliest in ranked order and the worst the
/// latest.
pub fn rank(results: Vec<ScoredResult>) -> Ranking {
    let (mut responded, mut unresponsive): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|r| r.responded());

    responded.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    unresponsive.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));

    let extremes = Extremes {
        score: extreme_pair(&responded, Better::Higher, |r| Some(r.composite_score)),
        latency: extreme_pair(&responded, Better::Lower, |r| r.statistics.mean_latency_ms),
        jitter: extreme_pair(&responded, Better::Lower, |r| r.statistics.jitter_std_dev()),
        loss: extreme_pair(&responded, Better::Lower, |r| Some(r.statistics.loss_fraction)),
        rating: extreme_pair(&responded, Better::Higher, |r| r.region_rating.map(f64::from)),
    };

    let responded_count = responded.len();
    let mut ordered = responded;
    ordered.append(&mut unresponsive);

    Ranking {
        ordered,
        responded: responded_count,
        extremes,
    }
}

fn extreme_pair<F>(results: &[ScoredResult], better: Better, metric: F) -> Option<ExtremePair>
where
    F: Fn(&ScoredResult) -> Option<f64>,
{
    let mut best: Option<(&ScoredResult, f64)> = None;
    let mut worst: Option<(&ScoredResult, f64)> = None;

    for result in results {
        let Some(value) = metric(result) else { continue };

        let improves = |current: f64| match better {
            Better::Higher => value > current,
            Better::Lower => value < current,
        };
        let not_better = |current: f64| match better {
            Better::Higher => value <= current,
            Better::Lower => value >= current,
        };

        if best.map_or(true, |(_, current)| improves(current)) {
            best = Some((result, value));
        }
        if worst.map_or(true, |(_, current)| not_better(current)) {
            worst = Some((result, value));
        }
    }

    match (best, worst) {
        (Some((best, best_value)), Some((worst, worst_value))) => Some(ExtremePair {
            best: HostExtreme::of(best, best_value),
            worst: HostExtreme::of(worst, worst_value),
        }),
        _ => None,
    }
}
