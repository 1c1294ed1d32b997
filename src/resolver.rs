//! Cache-aside resolver
//!
//! Decides, for one search request, whether the persistent store already
//! covers the requested scope or a provider fetch is needed, and applies the
//! stale-cache fallback policy when the fetch fails.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::provider::SearchProvider;
use crate::store::ResultStore;
use crate::task::{Provenance, SearchOutcome, SearchRequest, TaskError, TaskResult};

/// Resolves one request at a time against a shared store and provider
///
/// Holds its collaborators behind trait objects so the dispatcher owns a
/// single resolver shared by all workers and tests can substitute doubles.
pub struct Resolver {
    store: Arc<dyn ResultStore>,
    provider: Arc<dyn SearchProvider>,
}

impl Resolver {
    pub fn new(store: Arc<dyn ResultStore>, provider: Arc<dyn SearchProvider>) -> Self {
        Self { store, provider }
    }

    /// Produces exactly one result for the request
    ///
    /// # Behavior
    /// - Returns `Cancelled` without touching the store or provider if the
    ///   token has already fired
    /// - Serves covered requests straight from the store (no network call)
    /// - On a miss, fetches once, writes through, and re-reads the store so
    ///   the response reflects exactly what is now durably stored
    /// - On fetch failure, falls back to whatever the store holds; only when
    ///   the store is empty for the topic does the provider error surface
    /// - Store failures are fatal for the task, never masked as empty results
    pub async fn resolve(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> TaskResult {
        if cancel.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        let coverage = self.store.max_covered_scope(&request.topic)?;
        if coverage.covers(request) {
            debug!(topic = %request.topic, "cache hit, serving from store");
            let items = self
                .store
                .read_top_k(&request.topic, request.days, request.max_items)?;
            return Ok(SearchOutcome {
                items,
                provenance: Provenance::Cache,
            });
        }

        debug!(topic = %request.topic, "cache miss, fetching from provider");
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(TaskError::Cancelled),
            fetched = self
                .provider
                .fetch(&request.topic, request.days, request.max_items) => fetched,
        };

        match fetched {
            Ok(items) => {
                self.store
                    .append(&request.topic, request.days, request.max_items, &items)?;
                // Post-write read: one extra store access buys the guarantee
                // that the caller sees what was actually persisted.
                let items = self
                    .store
                    .read_top_k(&request.topic, request.days, request.max_items)?;
                Ok(SearchOutcome {
                    items,
                    provenance: Provenance::Provider,
                })
            }
            Err(err) => {
                let items = self
                    .store
                    .read_top_k(&request.topic, request.days, request.max_items)?;
                if items.is_empty() {
                    Err(TaskError::Provider(err))
                } else {
                    warn!(topic = %request.topic, error = %err, "provider failed, serving stale cache");
                    Ok(SearchOutcome {
                        items,
                        provenance: Provenance::Cache,
                    })
                }
            }
        }
    }
}
