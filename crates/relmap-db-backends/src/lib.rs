//! # relmap-db-backends
//!
//! Reference query executors for relmap. Each backend implements
//! [`QueryExecutor`](relmap_db::QueryExecutor) to run the selects a
//! [`JoinMapper`](relmap_db::JoinMapper) generates, and
//! [`TableMetadata`](relmap_db::TableMetadata) to derive join specifications
//! from the live schema.
//!
//! Supported backends:
//! - `SQLite` (feature `sqlite`, enabled by default)

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
// significant_drop_tightening: false positives with Mutex guards held inside spawn_blocking
#![allow(clippy::significant_drop_tightening)]

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
