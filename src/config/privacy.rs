//! Privacy weighting configuration and region ratings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in privacy ratings per two-letter region tag
pub const DEFAULT_REGION_RATINGS: &[(&str, u8)] = &[
    ("CH", 100),
    ("PA", 95),
    ("RO", 90),
    ("IS", 90),
    ("VG", 85),
    ("LI", 85),
    ("SC", 80),
    ("AD", 80),
    ("MC", 80),
    ("MD", 75),
    ("SM", 75),
    ("VA", 70),
    ("CY", 65),
    ("IE", 60),
    ("NO", 50),
    ("PT", 50),
    ("SE", 45),
    ("IT", 45),
    ("ES", 45),
    ("DE", 40),
    ("FR", 40),
    ("NL", 40),
    ("NZ", 35),
    ("BE", 35),
    ("DK", 35),
    ("CA", 30),
    ("AU", 30),
    ("UK", 25),
    ("US", 20),
];

/// Ratings at or above this are highlighted as privacy friendly
pub const PRIVACY_FRIENDLY_THRESHOLD: u8 = 80;

/// Read-only privacy weighting used by the scorer for a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyConfiguration {
    pub enabled: bool,
    /// Share of the composite score given to the region rating, in `[0, 1]`
    pub weight: f64,
    /// Region tag (upper case) to rating in `0..=100`
    pub ratings: BTreeMap<String, u8>,
}

impl Default for PrivacyConfiguration {
    fn default() -> Self {
        Self {
            enabled: crate::defaults::DEFAULT_PRIVACY_ENABLED,
            weight: crate::defaults::DEFAULT_PRIVACY_WEIGHT,
            ratings: default_ratings(),
        }
    }
}

impl PrivacyConfiguration {
    pub fn new(enabled: bool, weight: f64, ratings: BTreeMap<String, u8>) -> Self {
        Self { enabled, weight, ratings }
    }

    /// Built-in ratings merged with the configured overrides
    pub fn from_config(config: &crate::models::Config) -> Self {
        let mut privacy = Self::new(config.privacy_enabled, config.privacy_weight, default_ratings());
        privacy.apply_overrides(config.privacy_scores.clone());
        privacy
    }

    /// Same ratings with privacy weighting switched off
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// Rating for a region tag; unknown tags rate 0
    pub fn rating(&self, region_tag: &str) -> u8 {
        self.ratings
            .get(&region_tag.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or(0)
    }

    /// Rating that applies to a host, if privacy weighting is on and the host has a tag
    pub fn applicable_rating(&self, region_tag: Option<&str>) -> Option<u8> {
        if !self.enabled {
            return None;
        }
        region_tag.map(|tag| self.rating(tag))
    }

    /// Merge rating overrides on top of the current table
    pub fn apply_overrides(&mut self, overrides: BTreeMap<String, u8>) {
        self.ratings.extend(overrides);
    }
}

/// The built-in ratings table as an owned map
pub fn default_ratings() -> BTreeMap<String, u8> {
    DEFAULT_REGION_RATINGS
        .iter()
        .map(|(tag, rating)| (tag.to_string(), *rating))
        .collect()
}

/// Parse `"CC=score,CC=score"` rating overrides.
///
/// Tags are upper-cased and scores clamped to `0..=100`. Malformed items are
/// returned separately so the caller can warn about them.
pub fn parse_rating_overrides(input: &str) -> (BTreeMap<String, u8>, Vec<String>) {
    let mut ratings = BTreeMap::new();
    let mut rejected = Vec::new();

    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = item.split_once('=').and_then(|(tag, score)| {
            let tag = tag.trim().to_ascii_uppercase();
            let score = score.trim().parse::<i64>().ok()?;
            if tag.is_empty() {
                return None;
            }
            Some((tag, score.clamp(0, 100) as u8))
        });

        match parsed {
            Some((tag, score)) => {
                ratings.insert(tag, score);
            }
            None => rejected.push(item.to_string()),
        }
    }

    (ratings, rejected)
}
