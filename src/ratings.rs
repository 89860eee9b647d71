use crate::summary::SkuSummary;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rating statistics for one app, computed by the ratings feed collaborator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RatingAggregate {
    pub lifetime_average: f64,
    pub lifetime_sample_count: u64,
    #[serde(default)]
    pub new_rating_count: u64,
    #[serde(default)]
    pub average_by_version: BTreeMap<String, f64>,
    #[serde(default)]
    pub count_by_version: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingOverlay {
    pub lifetime_average_rating: f64,
    pub lifetime_rating_samples: u64,
    pub new_rating_count: u64,
    pub average_rating_by_version: BTreeMap<String, f64>,
    pub rating_count_by_version: BTreeMap<String, u64>,
}

impl RatingOverlay {
    pub(crate) fn densify(&mut self, versions: &[String]) {
        for version in versions {
            self.average_rating_by_version
                .entry(version.clone())
                .or_insert(0.0);
            self.rating_count_by_version
                .entry(version.clone())
                .or_insert(0);
        }
    }

    // Versions only the ratings feed knows about are dropped.
    pub(crate) fn overlay(&mut self, aggregate: &RatingAggregate) {
        self.lifetime_average_rating = aggregate.lifetime_average;
        self.lifetime_rating_samples = aggregate.lifetime_sample_count;
        self.new_rating_count = aggregate.new_rating_count;
        for (version, average) in self.average_rating_by_version.iter_mut() {
            if let Some(incoming) = aggregate.average_by_version.get(version) {
                *average = *incoming;
            }
        }
        for (version, count) in self.rating_count_by_version.iter_mut() {
            if let Some(incoming) = aggregate.count_by_version.get(version) {
                *count = *incoming;
            }
        }
    }
}

/// Reads rating aggregates keyed by app identifier.
pub fn load_json<R: std::io::Read>(reader: R) -> Result<BTreeMap<String, RatingAggregate>> {
    serde_json::from_reader(reader).context("Failed to deserialize rating aggregates")
}

/// Returns how many summaries received an aggregate.
pub fn merge_ratings(
    summaries: &mut BTreeMap<String, SkuSummary>,
    ratings: &BTreeMap<String, RatingAggregate>,
) -> usize {
    let mut merged = 0;
    for summary in summaries.values_mut() {
        match ratings.get(summary.app_id()) {
            Some(aggregate) => {
                summary.apply_ratings(aggregate);
                merged += 1;
            }
            None => debug!("No ratings for {} ({})", summary.sku(), summary.app_id()),
        }
    }
    merged
}
