use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Names of the report files already summarised by an earlier run.
#[derive(Debug, Clone)]
pub struct SeenLedger {
    path: PathBuf,
    names: BTreeSet<String>,
}

impl SeenLedger {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let names = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read ledger {}", path.display()))?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        } else {
            BTreeSet::new()
        };
        Ok(Self { path, names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn record<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.names.extend(names);
    }

    pub fn save(&self) -> Result<()> {
        let mut contents = String::new();
        for name in &self.names {
            contents.push_str(name);
            contents.push('\n');
        }
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write ledger {}", self.path.display()))
    }
}
