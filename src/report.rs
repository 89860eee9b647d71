use crate::Units;
use crate::summary::SkuSummary;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, PartialEq, Serialize)]
pub struct SummaryRow {
    sku: String,
    name: String,
    app_id: String,
    latest_version: String,
    all_installs: Units,
    paid_installs: Units,
    free_installs: Units,
    updates: Units,
    refunds: Units,
    promo_codes: Units,
    proceeds: String,
    new_all_installs: Units,
    new_paid_installs: Units,
    new_free_installs: Units,
    new_updates: Units,
    new_promo_codes: Units,
    new_proceeds: String,
    new_data_from: Option<NaiveDate>,
    new_data_to: Option<NaiveDate>,
    legacy_user_percentage: Option<String>,
    lifetime_average_rating: Option<String>,
    ratings: u64,
    new_ratings: u64,
}

impl From<&SkuSummary> for SummaryRow {
    fn from(summary: &SkuSummary) -> Self {
        let totals = summary.totals();
        let new_totals = summary.new_totals();
        let ratings = summary.ratings();
        Self {
            sku: summary.sku().to_string(),
            name: summary.display_name().to_string(),
            app_id: summary.app_id().to_string(),
            latest_version: summary.latest_version().unwrap_or_default().to_string(),
            all_installs: totals.all_installs,
            paid_installs: totals.paid_installs,
            free_installs: totals.free_installs,
            updates: totals.updates,
            refunds: totals.refunds,
            promo_codes: totals.promo_codes,
            proceeds: totals.proceeds.to_string(),
            new_all_installs: new_totals.all_installs,
            new_paid_installs: new_totals.paid_installs,
            new_free_installs: new_totals.free_installs,
            new_updates: new_totals.updates,
            new_promo_codes: new_totals.promo_codes,
            new_proceeds: new_totals.proceeds.to_string(),
            new_data_from: summary.new_data_dates().map(|range| range.first),
            new_data_to: summary.new_data_dates().map(|range| range.last),
            legacy_user_percentage: summary
                .legacy_user_percentage()
                .map(|pct| format!("{pct:.1}")),
            lifetime_average_rating: (ratings.lifetime_rating_samples > 0)
                .then(|| format!("{:.1}", ratings.lifetime_average_rating)),
            ratings: ratings.lifetime_rating_samples,
            new_ratings: ratings.new_rating_count,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VersionRow {
    sku: String,
    version: String,
    installs: Units,
    updates: Units,
    refunds: Units,
    promo_codes: Units,
    proceeds: String,
    retention_percentage: Option<String>,
    average_rating: Option<String>,
    ratings: u64,
}

impl VersionRow {
    fn rows(summary: &SkuSummary) -> impl Iterator<Item = VersionRow> + '_ {
        let by_version = summary.by_version();
        let ratings = summary.ratings();
        summary.versions().iter().rev().map(move |version| {
            let rating_count = ratings
                .rating_count_by_version
                .get(version)
                .copied()
                .unwrap_or(0);
            Self {
                sku: summary.sku().to_string(),
                version: version.clone(),
                installs: by_version.installs.get(version).copied().unwrap_or(0),
                updates: by_version.updates.get(version).copied().unwrap_or(0),
                refunds: by_version.refunds.get(version).copied().unwrap_or(0),
                promo_codes: by_version.promo_codes.get(version).copied().unwrap_or(0),
                proceeds: by_version
                    .proceeds
                    .get(version)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                retention_percentage: summary
                    .user_retention_by_version()
                    .get(version)
                    .map(|ratio| format!("{:.1}", ratio * 100.0)),
                average_rating: (rating_count > 0).then(|| {
                    let average = ratings
                        .average_rating_by_version
                        .get(version)
                        .copied()
                        .unwrap_or(0.0);
                    format!("{average:.1}")
                }),
                ratings: rating_count,
            }
        })
    }
}

pub fn write_summary_csv<W: std::io::Write>(
    summaries: &BTreeMap<String, SkuSummary>,
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in summaries.values().map(SummaryRow::from) {
        writer.serialize(row).context("Failed to write to CSV")?;
    }
    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}

/// One row per SKU and version, latest version first.
pub fn write_versions_csv<W: std::io::Write>(
    summaries: &BTreeMap<String, SkuSummary>,
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in summaries.values().flat_map(VersionRow::rows) {
        writer.serialize(row).context("Failed to write to CSV")?;
    }
    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}
