//! Accumulating indexer record cache.
//!
//! Rate-limits expensive "list items since timestamp" indexer queries by
//! accumulating their results per (subject, kind) pair in a durable SQLite
//! store. See [`cache::IndexerCache::accumulate`] for the core contract.

pub mod cache;
pub mod db;
pub mod indexer;
pub mod worker;
