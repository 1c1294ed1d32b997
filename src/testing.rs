//! In-memory doubles for the store and provider contracts
//!
//! Used by the resolver and dispatcher unit tests to observe call counts,
//! script provider outcomes, and inject failures without touching the
//! filesystem or the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::provider::{ProviderError, SearchProvider};
use crate::store::{CacheRecord, Coverage, ResultStore, StoreError};
use crate::task::ResultItem;

pub fn items(titles: &[&str]) -> Vec<ResultItem> {
    titles
        .iter()
        .map(|t| ResultItem {
            title: t.to_string(),
            url: format!("https://example.com/{t}"),
        })
        .collect()
}

/// Arguments of one observed `append` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendCall {
    pub topic: String,
    pub days: u32,
    pub max_items: u32,
    pub items: Vec<ResultItem>,
}

/// In-memory `ResultStore` with call counters and an injectable failure
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CacheRecord>>,
    pub reads: AtomicUsize,
    pub appends: Mutex<Vec<AppendCall>>,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store as if `items` had been fetched under the given
    /// scope tag
    pub fn seed(&self, topic: &str, days: u32, max_items: u32, items: &[ResultItem]) {
        let fetched_at = Utc::now();
        let mut records = self.records.lock().unwrap();
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
    }

    /// Makes every subsequent store call fail
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> Vec<AppendCall> {
        self.appends.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected failure")));
        }
        Ok(())
    }
}

impl ResultStore for MemoryStore {
    fn max_covered_scope(&self, topic: &str) -> Result<Coverage, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let records = self.records.lock().unwrap();
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
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let records = self.records.lock().unwrap();
        let mut matching: Vec<&CacheRecord> =
            records.iter().filter(|r| r.topic == topic).collect();
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
        self.check_available()?;
        self.appends.lock().unwrap().push(AppendCall {
            topic: topic.to_string(),
            days,
            max_items,
            items: items.to_vec(),
        });
        self.seed(topic, days, max_items, items);
        Ok(())
    }
}

/// `SearchProvider` double that replays scripted outcomes in order
///
/// Tracks total calls plus the peak number of concurrent in-flight calls so
/// pool tests can assert that no more than N workers run at once.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<ResultItem>, ProviderError>>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artificial latency to every fetch, keeping workers busy long
    /// enough for concurrency assertions
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_success(&self, titles: &[&str]) {
        self.responses.lock().unwrap().push_back(Ok(items(titles)));
    }

    pub fn push_failure(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::Status("error".to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn fetch(
        &self,
        _topic: &str,
        _days: u32,
        max_items: u32,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Status("script exhausted".to_string())));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.map(|items| items.into_iter().take(max_items as usize).collect())
    }
}
