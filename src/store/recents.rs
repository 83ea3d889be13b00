use crate::error::StoreError;
use crate::store::jsonl::{read_jsonl, write_jsonl, LoadReport};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub const RECENTS_FILE: &str = "recents.jsonl";

/// Maximum number of launched applications remembered.
pub const MAX_RECENTS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub id: String,
    /// Launch time in milliseconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

/// Most-recently-used list of launched application ids, newest first.
#[derive(Debug)]
pub struct RecentsStore {
    path: PathBuf,
    limit: usize,
    entries: VecDeque<RecentEntry>,
}

impl RecentsStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit: limit.clamp(1, MAX_RECENTS),
            entries: VecDeque::new(),
        }
    }

    pub fn open(path: impl Into<PathBuf>, limit: usize) -> (Self, LoadReport) {
        let mut store = Self::new(path, limit);
        let report = store.load();
        (store, report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Replace the list with the persisted one. Bad lines are skipped; later
    /// duplicates of an id and entries beyond the limit are dropped.
    pub fn load(&mut self) -> LoadReport {
        let read = read_jsonl::<RecentEntry>(&self.path);
        self.entries.clear();
        for entry in read.records {
            if self.entries.iter().any(|e| e.id == entry.id) {
                continue;
            }
            self.entries.push_back(entry);
        }
        self.entries.truncate(self.limit);
        read.report
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_jsonl(&self.path, self.entries.iter())?;
        Ok(())
    }

    /// Record a launch of `id` now.
    pub fn bump(&mut self, id: &str) {
        self.bump_at(id, chrono::Utc::now().timestamp_millis());
    }

    /// Move `id` to the front with the given timestamp, dropping any older
    /// occurrence and anything past the limit.
    pub fn bump_at(&mut self, id: &str, timestamp: i64) {
        self.entries.retain(|e| e.id != id);
        self.entries.push_front(RecentEntry {
            id: id.to_string(),
            timestamp,
        });
        self.entries.truncate(self.limit);
    }

    /// Drop entries failing `keep`. Returns whether anything was removed.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| keep(&e.id));
        self.entries.len() != before
    }

    pub fn entries(&self) -> impl Iterator<Item = &RecentEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
