use crate::config::Config;
use crate::ledger::SeenLedger;
use crate::record::TaggedRecord;
use crate::rollup::RecordStore;
use anyhow::{Context, Result};
use log::{info, warn};
use rust_decimal::Decimal;

pub mod aggregator;
pub mod config;
pub mod currency;
pub mod ledger;
pub mod ratings;
pub mod record;
pub mod report;
pub mod rollup;
pub mod summary;
pub mod version_order;

pub type Units = i64;
pub type Money = Decimal;

pub trait Projector {
    fn project(&mut self, record: &TaggedRecord) -> Result<()>;
}

/// One batch run: load every report, summarise each SKU, overlay ratings and
/// write the CSV report to `writer`.
pub fn run<W: std::io::Write>(config: &Config, writer: W) -> Result<()> {
    let mut ledger = SeenLedger::load(config.ledger_path())?;
    let mut store = RecordStore::new();
    let new_files = store.load_dir(&config.reports_dir, &ledger)?;
    if store.is_empty() {
        warn!("No report lines found in {}", config.reports_dir.display());
    }
    info!(
        "Loaded {} report lines, {} new report files",
        store.len(),
        new_files.len()
    );

    let mut summaries = store.rollup(&config.reports_dir, config.version_order)?;
    if let Some(path) = &config.ratings_path {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open ratings {}", path.display()))?;
        let ratings = ratings::load_json(file)?;
        let merged = ratings::merge_ratings(&mut summaries, &ratings);
        info!("Merged ratings into {merged} of {} SKUs", summaries.len());
    }

    for summary in summaries.values() {
        if let Some(range) = summary.new_data_dates() {
            let new_totals = summary.new_totals();
            info!(
                "New data for {} from {} to {}: {} installs ({} paid, {} free), {} updates, \
                 {} promo codes, {} new ratings, proceeds {}",
                summary.display_name(),
                range.first,
                range.last,
                new_totals.all_installs,
                new_totals.paid_installs,
                new_totals.free_installs,
                new_totals.updates,
                new_totals.promo_codes,
                summary.ratings().new_rating_count,
                new_totals.proceeds
            );
        }
    }

    if config.detailed {
        report::write_versions_csv(&summaries, writer)?;
    } else {
        report::write_summary_csv(&summaries, writer)?;
    }

    if !config.dry_run && !new_files.is_empty() {
        ledger.record(new_files);
        ledger.save()?;
    }
    Ok(())
}
