use crate::version_order::VersionOrder;
use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::PathBuf;

const DEFAULT_REPORTS_DIR: &str = "reports";
const LEDGER_FILE: &str = ".seen_reports";

/// Run configuration, from `HARVEST_*` environment variables overridden by
/// command line arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub reports_dir: PathBuf,
    ledger_path: Option<PathBuf>,
    pub ratings_path: Option<PathBuf>,
    pub version_order: VersionOrder,
    /// Write the per-version breakdown instead of one row per SKU.
    pub detailed: bool,
    /// Leave the ledger untouched, so the same files stay new next run.
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let version_order = match lookup("HARVEST_VERSION_ORDER") {
            Some(order) => order
                .parse::<VersionOrder>()
                .context("Invalid HARVEST_VERSION_ORDER")?,
            None => VersionOrder::default(),
        };
        Ok(Self {
            reports_dir: lookup("HARVEST_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
            ledger_path: lookup("HARVEST_LEDGER").map(PathBuf::from),
            ratings_path: lookup("HARVEST_RATINGS").map(PathBuf::from),
            version_order,
            detailed: flag(lookup("HARVEST_DETAILED"))?,
            dry_run: flag(lookup("HARVEST_DRY_RUN"))?,
        })
    }

    pub fn apply_args<I>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--detailed" => self.detailed = true,
                "--dry-run" => self.dry_run = true,
                "--ratings" => {
                    let path = args.next().ok_or(anyhow!("--ratings needs a path"))?;
                    self.ratings_path = Some(PathBuf::from(path));
                }
                "--version-order" => {
                    let order = args
                        .next()
                        .ok_or(anyhow!("--version-order needs a value"))?;
                    self.version_order = order.parse::<VersionOrder>()?;
                }
                other if other.starts_with("--") => bail!("Unknown option: {other}"),
                dir => self.reports_dir = PathBuf::from(dir),
            }
        }
        Ok(self)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.reports_dir.join(LEDGER_FILE))
    }
}

fn flag(value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(anyhow!("Invalid flag value: {other}")),
    }
}
