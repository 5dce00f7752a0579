//! Snapshot history persisted to a single JSON file.

use crate::error::Result;
use crate::types::StoredSnapshot;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of snapshots kept.
pub const MAX_HISTORY: usize = 40;

/// Append-only store of recent snapshots.
pub trait SnapshotHistory {
    fn append(&self, entry: StoredSnapshot) -> Result<()>;

    /// Up to `n` most recent entries, oldest first.
    fn last_n(&self, n: usize) -> Result<Vec<StoredSnapshot>>;

    /// Up to `n` most recent entries for `symbol`, oldest first. Symbols
    /// match case-insensitively, as tracker registry keys do.
    fn last_n_for(&self, symbol: &str, n: usize) -> Result<Vec<StoredSnapshot>> {
        let mut entries: Vec<StoredSnapshot> = self
            .last_n(usize::MAX)?
            .into_iter()
            .filter(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
            .collect();
        let skip = entries.len().saturating_sub(n);
        Ok(entries.split_off(skip))
    }
}

/// History kept as one JSON array, trimmed to the newest `max` entries on
/// every write.
pub struct JsonHistoryStore {
    path: PathBuf,
    max: usize,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>, max: usize) -> Self {
        Self {
            path: path.into(),
            max: max.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored entry. A missing or unreadable file is an empty history.
    pub fn load(&self) -> Vec<StoredSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if self.path.exists() {
                    warn!("Failed to read history {:?}: {}", self.path, e);
                }
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to parse history {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }
}

impl SnapshotHistory for JsonHistoryStore {
    fn append(&self, entry: StoredSnapshot) -> Result<()> {
        let mut history = self.load();
        history.push(entry);
        if history.len() > self.max {
            history.drain(..history.len() - self.max);
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&history)?)?;
        debug!("History {:?} now holds {} snapshots", self.path, history.len());
        Ok(())
    }

    fn last_n(&self, n: usize) -> Result<Vec<StoredSnapshot>> {
        let mut history = self.load();
        let skip = history.len().saturating_sub(n);
        Ok(history.split_off(skip))
    }
}
