//! Core task model for topic searches
//!
//! Defines the request, result, and error types that flow between the CLI,
//! the dispatcher, and the cache-aside resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;

/// A single topic-search request
///
/// `days` is the recency window (how many days back results may reach) and
/// `max_items` bounds the result list. Both must be at least 1; the dispatcher
/// rejects invalid requests at submission time so the resolver never sees
/// them. Topics are compared byte-for-byte with no normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Topic to search for
    pub topic: String,
    /// Recency window in days (>= 1)
    pub days: u32,
    /// Maximum number of items to return (>= 1)
    pub max_items: u32,
}

impl SearchRequest {
    pub fn new(topic: impl Into<String>, days: u32, max_items: u32) -> Self {
        Self {
            topic: topic.into(),
            days,
            max_items,
        }
    }

    /// Checks the request against submission-time validity rules
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.days < 1 {
            return Err(TaskError::InvalidRequest(format!(
                "days must be at least 1, got {}",
                self.days
            )));
        }
        if self.max_items < 1 {
            return Err(TaskError::InvalidRequest(format!(
                "max_items must be at least 1, got {}",
                self.max_items
            )));
        }
        Ok(())
    }
}

/// One search hit, immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Article headline
    pub title: String,
    /// Link to the article
    pub url: String,
}

/// Where a result list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Served from the persistent store without a network call
    Cache,
    /// Freshly fetched from the external provider (and written through)
    Provider,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Cache => write!(f, "cache"),
            Provenance::Provider => write!(f, "api"),
        }
    }
}

/// Successful outcome of one resolved request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Up to `max_items` results, most recently fetched first
    pub items: Vec<ResultItem>,
    /// Whether the items came from the store or a fresh fetch
    pub provenance: Provenance,
}

/// Terminal failure modes for a submitted task
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task's deadline or cancellation signal fired before or during
    /// resolution; never retried
    #[error("request cancelled")]
    Cancelled,

    /// Provider call failed and the store held nothing usable to fall back on
    #[error("search provider unavailable: {0}")]
    Provider(#[from] ProviderError),

    /// Persistence layer failure, fatal for the task
    #[error("result store unavailable: {0}")]
    Store(#[from] StoreError),

    /// The bounded task queue was full at submission time; the caller decides
    /// whether to retry or drop
    #[error("task queue is full")]
    QueueFull,

    /// The dispatcher has been shut down and accepts no new tasks
    #[error("dispatcher is shut down")]
    Shutdown,

    /// Request rejected at submission time
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Exactly one of these is delivered per submitted request
pub type TaskResult = Result<SearchOutcome, TaskError>;
