//! Append-only record store backed by a JSON file
//!
//! Provides a `JsonStore` that persists fetched search results to disk as
//! scope-tagged records, supporting coverage lookups and most-recent-first
//! reads when the cache can answer a request without a network call.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{ResultItem, SearchRequest};

/// File holding the full record set inside the store directory
const RECORDS_FILE: &str = "records.json";

/// Errors raised by the persistence layer
///
/// Any of these is fatal for the task that triggered the store call; the
/// resolver never converts a store failure into an empty result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem I/O failed
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk record file could not be encoded or decoded
    #[error("store (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One stored result, tagged with the request scope that produced it
///
/// Records are append-only: a fetch inserts new records and never updates
/// existing ones, so several records may exist for the same topic with
/// different scope tags. Re-fetching a topic may duplicate titles; readers
/// rely on most-recent-first ordering rather than deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Topic the producing request asked for (byte-exact, no normalization)
    pub topic: String,
    /// Recency window of the producing request
    pub days: u32,
    /// Item cap of the producing request
    pub max_items: u32,
    /// Article headline
    pub title: String,
    /// Link to the article
    pub url: String,
    /// When the producing fetch completed
    pub fetched_at: DateTime<Utc>,
}

/// The widest scope ever stored for a topic
///
/// `days` and `max_items` are maximized independently across all records, so
/// they need not come from the same fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coverage {
    pub days: u32,
    pub max_items: u32,
}

impl Coverage {
    /// Whether this stored scope is at least as wide as the request's scope
    pub fn covers(&self, request: &SearchRequest) -> bool {
        self.days >= request.days && self.max_items >= request.max_items
    }
}

/// Contract between the resolver and the persistence layer
///
/// Kept as a trait so tests can substitute an in-memory double for the
/// file-backed store. Implementations must tolerate concurrent reads and
/// concurrent appends; serializing internally is sufficient since records
/// are never updated in place.
pub trait ResultStore: Send + Sync {
    /// Maximum days and max_items ever recorded for `topic`, each computed
    /// independently across all records; zeroes if the topic is unseen
    fn max_covered_scope(&self, topic: &str) -> Result<Coverage, StoreError>;

    /// Up to `max_items` stored items for `topic`, most recently fetched
    /// first. Records from any stored scope tag are eligible; `days` does not
    /// restrict which rows qualify.
    fn read_top_k(
        &self,
        topic: &str,
        days: u32,
        max_items: u32,
    ) -> Result<Vec<ResultItem>, StoreError>;

    /// Inserts one new record per item, tagged with the producing scope and
    /// the current time
    fn append(
        &self,
        topic: &str,
        days: u32,
        max_items: u32,
        items: &[ResultItem],
    ) -> Result<(), StoreError>;
}

/// File-backed `ResultStore`
///
/// All records live in a single JSON array at `<dir>/records.json`, loaded
/// into memory on open. Reads and appends go through one mutex; an append
/// pushes the new records and rewrites the file while holding the lock, so
/// concurrent workers never interleave writes.
pub struct JsonStore {
    records: Mutex<Vec<CacheRecord>>,
    path: PathBuf,
}

impl JsonStore {
    /// Opens the store in the XDG-compliant cache directory
    /// (`~/.cache/newscache/` on Linux)
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory); I/O failures while loading surface as `Some(Err(..))`
    /// via `open_in_dir`.
    pub fn open_default() -> Option<Result<Self, StoreError>> {
        let project_dirs = ProjectDirs::from("", "", "newscache")?;
        Some(Self::open_in_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Opens (or creates) the store in a specific directory
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn open_in_dir(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        let path = dir.join(RECORDS_FILE);
        let records = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            records: Mutex::new(records),
            path,
        })
    }

    /// Writes the full record set back to disk; called with the lock held
    fn persist(&self, records: &[CacheRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ResultStore for JsonStore {
    fn max_covered_scope(&self, topic: &str) -> Result<Coverage, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        let mut coverage = Coverage::default();
        for record in records.iter().filter(|r| r.topic == topic) {
            coverage.days = coverage.days.max(record.days);
            coverage.max_items = coverage.max_items.max(record.max_items);
        }
        Ok(coverage)
    }

    fn read_top_k(
        &self,
        topic: &str,
        _days: u32,
        max_items: u32,
    ) -> Result<Vec<ResultItem>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        let mut matching: Vec<&CacheRecord> =
            records.iter().filter(|r| r.topic == topic).collect();
        // Stable sort: records from the same fetch share a timestamp and keep
        // their original order.
        matching.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        Ok(matching
            .into_iter()
            .take(max_items as usize)
            .map(|r| ResultItem {
                title: r.title.clone(),
                url: r.url.clone(),
            })
            .collect())
    }

    fn append(
        &self,
        topic: &str,
        days: u32,
        max_items: u32,
        items: &[ResultItem],
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let fetched_at = Utc::now();
        for item in items {
            records.push(CacheRecord {
                topic: topic.to_string(),
                days,
                max_items,
                title: item.title.clone(),
                url: item.url.clone(),
                fetched_at,
            });
        }
        self.persist(&records)
    }
}
