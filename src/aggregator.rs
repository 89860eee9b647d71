use crate::record::{NormalizedRecord, RecordKind, TaggedRecord};
use crate::ratings::RatingOverlay;
use crate::summary::{
    CountryBreakdown, DateBreakdown, DateRange, SkuSummary, Totals, VersionBreakdown,
};
use crate::version_order::VersionOrder;
use crate::{Money, Projector, Units};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Default, Clone)]
struct FirstNonBlank(Option<String>);

impl FirstNonBlank {
    fn offer(&mut self, candidate: &str) {
        if self.0.is_some() {
            return;
        }
        let candidate = candidate.trim();
        if !candidate.is_empty() {
            self.0 = Some(candidate.to_string());
        }
    }

    fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn resolve(self) -> String {
        self.0.unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// A sale-kind line, classified once and then folded into every bucket.
struct Sale<'a> {
    version: &'a str,
    date: NaiveDate,
    country: &'a str,
    currency: &'a str,
    units: Units,
    proceeds: Money,
    promo: bool,
}

impl<'a> From<&'a NormalizedRecord> for Sale<'a> {
    fn from(record: &'a NormalizedRecord) -> Self {
        Self {
            version: &record.version,
            date: record.begin_date,
            country: &record.country,
            currency: &record.currency,
            units: record.units,
            proceeds: record.proceeds(),
            promo: record.has_promo_code(),
        }
    }
}

impl Sale<'_> {
    fn is_paid(&self) -> bool {
        !self.proceeds.is_zero()
    }

    fn refunded(&self) -> Units {
        if self.units < 0 { -self.units } else { 0 }
    }
}

impl Totals {
    fn record_sale(&mut self, sale: &Sale) {
        self.all_installs += sale.units;
        self.proceeds.add(sale.currency, sale.proceeds);
        self.refunds += sale.refunded();
        if sale.promo {
            self.promo_codes += sale.units;
        }
        if sale.is_paid() {
            self.paid_installs += sale.units;
        } else {
            self.free_installs += sale.units;
        }
    }
}

impl VersionBreakdown {
    fn record_sale(&mut self, sale: &Sale) {
        *self.installs.entry(sale.version.to_string()).or_default() += sale.units;
        self.proceeds
            .entry(sale.version.to_string())
            .or_default()
            .add(sale.currency, sale.proceeds);
        if sale.units < 0 {
            *self.refunds.entry(sale.version.to_string()).or_default() += sale.refunded();
        }
        if sale.promo {
            *self.promo_codes.entry(sale.version.to_string()).or_default() += sale.units;
        }
    }

    fn record_update(&mut self, version: &str, units: Units) {
        *self.updates.entry(version.to_string()).or_default() += units;
    }

    fn densify(&mut self, versions: &[String]) {
        for version in versions {
            self.installs.entry(version.clone()).or_insert(0);
            self.updates.entry(version.clone()).or_insert(0);
            self.refunds.entry(version.clone()).or_insert(0);
            self.promo_codes.entry(version.clone()).or_insert(0);
            self.proceeds.entry(version.clone()).or_default();
        }
    }
}

impl DateBreakdown {
    fn touch(&mut self, date: NaiveDate) {
        self.all_installs.entry(date).or_insert(0);
        self.paid_installs.entry(date).or_insert(0);
        self.free_installs.entry(date).or_insert(0);
        self.updates.entry(date).or_insert(0);
        self.proceeds.entry(date).or_default();
    }

    fn record_sale(&mut self, sale: &Sale) {
        *self.all_installs.entry(sale.date).or_default() += sale.units;
        self.proceeds
            .entry(sale.date)
            .or_default()
            .add(sale.currency, sale.proceeds);
        let bucket = if sale.is_paid() {
            &mut self.paid_installs
        } else {
            &mut self.free_installs
        };
        *bucket.entry(sale.date).or_default() += sale.units;
    }

    fn record_update(&mut self, date: NaiveDate, units: Units) {
        *self.updates.entry(date).or_default() += units;
    }
}

impl CountryBreakdown {
    fn record_sale(&mut self, sale: &Sale) {
        *self.all_installs.entry(sale.country.to_string()).or_default() += sale.units;
        let bucket = if sale.is_paid() {
            &mut self.paid_installs
        } else {
            &mut self.free_installs
        };
        *bucket.entry(sale.country.to_string()).or_default() += sale.units;
    }

    fn densify<'a, I>(&mut self, countries: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for country in countries {
            self.all_installs.entry(country.clone()).or_insert(0);
            self.paid_installs.entry(country.clone()).or_insert(0);
            self.free_installs.entry(country.clone()).or_insert(0);
        }
    }
}

/// Accumulates one SKU's tagged records. Feed it records in date order through
/// [`Projector::project`], then [`SummaryBuilder::finish`]; or use
/// [`SummaryBuilder::build`], which sorts first.
#[derive(Debug)]
pub struct SummaryBuilder {
    artifact_dir: PathBuf,
    order: VersionOrder,
    sku: FirstNonBlank,
    title: FirstNonBlank,
    app_id: FirstNonBlank,
    versions: BTreeSet<String>,
    totals: Totals,
    new_totals: Totals,
    by_version: VersionBreakdown,
    by_date: DateBreakdown,
    by_country: CountryBreakdown,
    new_by_country: CountryBreakdown,
    new_data_dates: Option<DateRange>,
}

impl SummaryBuilder {
    pub fn new<P: Into<PathBuf>>(artifact_dir: P, order: VersionOrder) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            order,
            sku: Default::default(),
            title: Default::default(),
            app_id: Default::default(),
            versions: Default::default(),
            totals: Default::default(),
            new_totals: Default::default(),
            by_version: Default::default(),
            by_date: Default::default(),
            by_country: Default::default(),
            new_by_country: Default::default(),
            new_data_dates: None,
        }
    }

    pub fn build<P: Into<PathBuf>>(
        artifact_dir: P,
        mut records: Vec<TaggedRecord>,
        order: VersionOrder,
    ) -> Result<SkuSummary> {
        if records.is_empty() {
            bail!("No report lines to summarise");
        }
        records.sort_by_key(|tagged| tagged.record.begin_date);
        let mut builder = Self::new(artifact_dir, order);
        for tagged in &records {
            builder.project(tagged)?;
        }
        Ok(builder.finish())
    }

    pub fn finish(self) -> SkuSummary {
        let mut versions: Vec<String> = self.versions.into_iter().collect();
        self.order.sort(&mut versions);

        let mut by_version = self.by_version;
        by_version.densify(&versions);
        let mut by_country = self.by_country;
        let countries: Vec<String> = by_country.all_installs.keys().cloned().collect();
        by_country.densify(&countries);
        let mut new_by_country = self.new_by_country;
        new_by_country.densify(&countries);
        let mut ratings = RatingOverlay::default();
        ratings.densify(&versions);

        let user_retention_by_version = user_retention(&versions, &by_version);
        let legacy_user_percentage =
            legacy_user_percentage(self.totals.all_installs, &versions, &by_version);

        let sku = self.sku.resolve();
        if legacy_user_percentage.is_none() {
            warn!("{sku} has no installs; legacy user percentage is undefined");
        }
        debug!(
            "Summarised {sku}: {} versions, {} installs, {} updates",
            versions.len(),
            self.totals.all_installs,
            self.totals.updates
        );

        SkuSummary {
            sku,
            display_name: self.title.resolve(),
            app_id: self.app_id.resolve(),
            artifact_dir: self.artifact_dir,
            versions,
            totals: self.totals,
            new_totals: self.new_totals,
            by_version,
            by_date: self.by_date,
            by_country,
            new_by_country,
            user_retention_by_version,
            legacy_user_percentage,
            new_data_dates: self.new_data_dates,
            ratings,
        }
    }
}

impl Projector for SummaryBuilder {
    fn project(&mut self, tagged: &TaggedRecord) -> Result<()> {
        let record = &tagged.record;
        if let Some(sku) = self.sku.get() {
            let incoming = record.sku.trim();
            if !incoming.is_empty() && incoming != sku {
                bail!("Report line for SKU {incoming} fed into summary for {sku}");
            }
        }
        self.sku.offer(&record.sku);
        self.title.offer(&record.title);
        self.app_id.offer(&record.app_id);

        let date = record.begin_date;
        self.versions.insert(record.version.clone());
        self.by_date.touch(date);
        if tagged.is_new {
            match self.new_data_dates.as_mut() {
                Some(range) => range.extend(date),
                None => self.new_data_dates = Some(DateRange::single(date)),
            }
        }

        match record.kind {
            RecordKind::Update => {
                self.totals.updates += record.units;
                self.by_version.record_update(&record.version, record.units);
                self.by_date.record_update(date, record.units);
                if tagged.is_new {
                    self.new_totals.updates += record.units;
                }
            }
            RecordKind::Sale => {
                let sale = Sale::from(record);
                self.totals.record_sale(&sale);
                self.by_version.record_sale(&sale);
                self.by_date.record_sale(&sale);
                self.by_country.record_sale(&sale);
                if tagged.is_new {
                    self.new_totals.record_sale(&sale);
                    self.new_by_country.record_sale(&sale);
                }
            }
        }
        Ok(())
    }
}

fn user_retention(versions: &[String], by_version: &VersionBreakdown) -> BTreeMap<String, f64> {
    let mut retention = BTreeMap::new();
    let mut prior: Units = 0;
    for version in versions {
        if prior > 0 {
            let updates = by_version.updates.get(version).copied().unwrap_or(0);
            retention.insert(version.clone(), updates as f64 / prior as f64);
        }
        prior += by_version.installs.get(version).copied().unwrap_or(0);
    }
    retention
}

fn legacy_user_percentage(
    all_installs: Units,
    versions: &[String],
    by_version: &VersionBreakdown,
) -> Option<f64> {
    if all_installs == 0 {
        return None;
    }
    let latest = versions.last()?;
    let on_latest = by_version.installs.get(latest).copied().unwrap_or(0)
        + by_version.updates.get(latest).copied().unwrap_or(0);
    Some(100.0 * (all_installs - on_latest) as f64 / all_installs as f64)
}
