//! Caching layer for extracted records.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteResultCache};
