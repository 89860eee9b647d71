use crate::Units;
use crate::currency::CurrencyAmounts;
use crate::ratings::{RatingAggregate, RatingOverlay};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub all_installs: Units,
    pub paid_installs: Units,
    pub free_installs: Units,
    pub updates: Units,
    pub refunds: Units,
    pub promo_codes: Units,
    pub proceeds: CurrencyAmounts,
}

/// Per-version figures. Every map has an entry for every summarised version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionBreakdown {
    pub installs: BTreeMap<String, Units>,
    pub updates: BTreeMap<String, Units>,
    pub refunds: BTreeMap<String, Units>,
    pub promo_codes: BTreeMap<String, Units>,
    pub proceeds: BTreeMap<String, CurrencyAmounts>,
}

/// Per-day figures. Every map has an entry for every day any report line fell on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateBreakdown {
    pub all_installs: BTreeMap<NaiveDate, Units>,
    pub paid_installs: BTreeMap<NaiveDate, Units>,
    pub free_installs: BTreeMap<NaiveDate, Units>,
    pub updates: BTreeMap<NaiveDate, Units>,
    pub proceeds: BTreeMap<NaiveDate, CurrencyAmounts>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryBreakdown {
    pub all_installs: BTreeMap<String, Units>,
    pub paid_installs: BTreeMap<String, Units>,
    pub free_installs: BTreeMap<String, Units>,
}

impl CountryBreakdown {
    /// Whether any country has a non-zero figure.
    pub fn has_activity(&self) -> bool {
        [&self.all_installs, &self.paid_installs, &self.free_installs]
            .iter()
            .any(|installs| installs.values().any(|units| *units != 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        Self {
            first: date,
            last: date,
        }
    }

    pub fn extend(&mut self, date: NaiveDate) {
        self.first = self.first.min(date);
        self.last = self.last.max(date);
    }

    pub fn is_single_day(&self) -> bool {
        self.first == self.last
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub installs: Units,
    pub updates: Units,
    pub proceeds: CurrencyAmounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    InstallsAndUpdates,
    Proceeds,
    PaidInstallsByCountry,
    FreeInstallsByCountry,
    AllInstallsByCountry,
    NewPaidInstallsByCountry,
    NewFreeInstallsByCountry,
    NewAllInstallsByCountry,
}

impl Chart {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Chart::InstallsAndUpdates => "AllInstallsAndUpdates",
            Chart::Proceeds => "Proceeds",
            Chart::PaidInstallsByCountry => "PaidInstallsByCountry",
            Chart::FreeInstallsByCountry => "FreeInstallsByCountry",
            Chart::AllInstallsByCountry => "AllInstallsByCountry",
            Chart::NewPaidInstallsByCountry => "NewPaidInstallsByCountry",
            Chart::NewFreeInstallsByCountry => "NewFreeInstallsByCountry",
            Chart::NewAllInstallsByCountry => "NewAllInstallsByCountry",
        }
    }
}

/// Point-in-time rollup of one SKU's report lines.
///
/// Built by [`crate::aggregator::SummaryBuilder`]; read-only afterwards apart from
/// [`SkuSummary::apply_ratings`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkuSummary {
    pub(crate) sku: String,
    pub(crate) display_name: String,
    pub(crate) app_id: String,
    pub(crate) artifact_dir: PathBuf,
    pub(crate) versions: Vec<String>,
    pub(crate) totals: Totals,
    pub(crate) new_totals: Totals,
    pub(crate) by_version: VersionBreakdown,
    pub(crate) by_date: DateBreakdown,
    pub(crate) by_country: CountryBreakdown,
    pub(crate) new_by_country: CountryBreakdown,
    pub(crate) user_retention_by_version: BTreeMap<String, f64>,
    pub(crate) legacy_user_percentage: Option<f64>,
    pub(crate) new_data_dates: Option<DateRange>,
    pub(crate) ratings: RatingOverlay,
}

impl SkuSummary {
    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Distinct versions, earliest first.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Totals accumulated only from lines first seen in this run.
    pub fn new_totals(&self) -> &Totals {
        &self.new_totals
    }

    pub fn by_version(&self) -> &VersionBreakdown {
        &self.by_version
    }

    pub fn by_date(&self) -> &DateBreakdown {
        &self.by_date
    }

    pub fn by_country(&self) -> &CountryBreakdown {
        &self.by_country
    }

    pub fn new_by_country(&self) -> &CountryBreakdown {
        &self.new_by_country
    }

    /// Share of the installs of all earlier versions that updated into each
    /// version. The earliest version never has an entry.
    pub fn user_retention_by_version(&self) -> &BTreeMap<String, f64> {
        &self.user_retention_by_version
    }

    /// `None` when the SKU has no installs at all.
    pub fn legacy_user_percentage(&self) -> Option<f64> {
        self.legacy_user_percentage
    }

    pub fn has_new_data(&self) -> bool {
        self.new_data_dates.is_some()
    }

    pub fn new_data_dates(&self) -> Option<DateRange> {
        self.new_data_dates
    }

    pub fn ratings(&self) -> &RatingOverlay {
        &self.ratings
    }

    pub fn apply_ratings(&mut self, aggregate: &RatingAggregate) {
        self.ratings.overlay(aggregate);
    }

    /// The `days` calendar days before `today`, oldest first, zero-filled for days
    /// without any report line.
    pub fn trailing_days(&self, today: NaiveDate, days: u64) -> Vec<DailyPoint> {
        (1..=days)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|date| DailyPoint {
                date,
                installs: self.by_date.all_installs.get(&date).copied().unwrap_or(0),
                updates: self.by_date.updates.get(&date).copied().unwrap_or(0),
                proceeds: self.by_date.proceeds.get(&date).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn charts(&self) -> Vec<Chart> {
        let mut charts = vec![
            Chart::InstallsAndUpdates,
            Chart::Proceeds,
            Chart::PaidInstallsByCountry,
            Chart::FreeInstallsByCountry,
            Chart::AllInstallsByCountry,
        ];
        if self.has_new_data() && self.new_by_country.has_activity() {
            charts.extend([
                Chart::NewPaidInstallsByCountry,
                Chart::NewFreeInstallsByCountry,
                Chart::NewAllInstallsByCountry,
            ]);
        }
        charts
    }

    pub fn chart_path(&self, chart: Chart) -> PathBuf {
        self.artifact_dir
            .join(format!("{}_{}.png", self.sku, chart.file_stem()))
    }
}
