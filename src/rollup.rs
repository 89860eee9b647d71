use crate::aggregator::SummaryBuilder;
use crate::ledger::SeenLedger;
use crate::record::{NormalizedRecord, TaggedRecord};
use crate::summary::SkuSummary;
use crate::version_order::VersionOrder;
use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// Every tagged report line known to one run.
pub struct RecordStore {
    records: Vec<TaggedRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn save(&mut self, record: TaggedRecord) {
        self.records.push(record);
    }

    pub fn load_csv<R: std::io::Read>(&mut self, reader: R, is_new: bool) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut loaded = 0;
        for (line, record) in reader.deserialize::<NormalizedRecord>().enumerate() {
            let record =
                record.with_context(|| format!("Malformed report line {}", line + 2))?;
            self.save(TaggedRecord::new(is_new, record));
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Loads every `.csv` report in `dir`, in file name order. Files missing from
    /// the ledger are tagged new; their names are returned.
    pub fn load_dir(&mut self, dir: &Path, ledger: &SeenLedger) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list reports in {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut new_files = Vec::new();
        for name in names {
            let is_new = !ledger.contains(&name);
            let file = std::fs::File::open(dir.join(&name))
                .with_context(|| format!("Failed to open report {name}"))?;
            let loaded = self
                .load_csv(file, is_new)
                .with_context(|| format!("Failed to load report {name}"))?;
            let tag = if is_new { " (new)" } else { "" };
            info!("Loaded {loaded} lines from {name}{tag}");
            if is_new {
                new_files.push(name);
            }
        }
        Ok(new_files)
    }

    pub fn rollup(
        &self,
        artifact_dir: &Path,
        order: VersionOrder,
    ) -> Result<BTreeMap<String, SkuSummary>> {
        rollup(self.records.iter().cloned(), artifact_dir, order)
    }
}

pub fn group_by_sku<I>(records: I) -> BTreeMap<String, Vec<TaggedRecord>>
where
    I: IntoIterator<Item = TaggedRecord>,
{
    let mut groups: BTreeMap<String, Vec<TaggedRecord>> = BTreeMap::new();
    for tagged in records {
        groups
            .entry(tagged.record.sku.trim().to_string())
            .or_default()
            .push(tagged);
    }
    groups
}

/// Builds one summary per SKU, keyed by the SKU the records were grouped under.
pub fn rollup<I>(
    records: I,
    artifact_dir: &Path,
    order: VersionOrder,
) -> Result<BTreeMap<String, SkuSummary>>
where
    I: IntoIterator<Item = TaggedRecord>,
{
    group_by_sku(records)
        .into_iter()
        .map(|(sku, records)| {
            let summary = SummaryBuilder::build(artifact_dir, records, order)
                .with_context(|| format!("Failed to summarise SKU {sku}"))?;
            Ok((sku, summary))
        })
        .collect()
}
