//! newscache library
//!
//! Cache-aside topic search: a bounded worker pool resolves search requests
//! against a persistent result store before falling back to the external
//! NewsAPI provider, writing fresh fetches through for future requests.

pub mod batch;
pub mod cli;
pub mod dispatcher;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod task;

#[cfg(test)]
pub mod testing;
