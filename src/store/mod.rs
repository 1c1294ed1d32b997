//! Persistent result store
//!
//! Append-only storage of previously fetched search results, queryable by
//! topic with a scope-coverage test.

pub mod records;

pub use records::{CacheRecord, Coverage, JsonStore, ResultStore, StoreError};
