//! # relmap
//!
//! Declarative join mapping for Rust.
//!
//! Describe a root table and the tables joined beneath it once, as a
//! [`JoinSpec`](db::JoinSpec) tree. relmap generates the `JOIN` chain and the
//! alias-qualified column list for it, and folds the flat, duplicated rows of
//! the outer-joined select back into nested, deduplicated records.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient access.
//! You can depend on `relmap` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use relmap::prelude::*;
//!
//! let comments = JoinSpec::builder("comments")
//!     .own_fields(["body"])
//!     .parent_field("id")
//!     .child_field("post_id")
//!     .build()
//!     .unwrap();
//! let posts = JoinSpec::builder("posts")
//!     .own_fields(["title"])
//!     .child("comments", comments)
//!     .build()
//!     .unwrap();
//!
//! let rows = vec![
//!     Row::from_pairs([
//!         ("posts_T_id", Value::Int(1)),
//!         ("posts_T_title", Value::from("Hello")),
//!         ("comments_T_id", Value::Int(7)),
//!         ("comments_T_body", Value::from("First!")),
//!     ]),
//! ];
//! let records = hydrate(&posts, &rows).unwrap();
//! assert_eq!(records[&CompositeKey::from(1)].children("comments").unwrap().len(), 1);
//! ```

/// Error types, settings, and logging.
pub use relmap_core as core;

/// Join specification trees, clause generation, and hydration.
pub use relmap_db as db;

/// Reference query executors: `SQLite`.
pub use relmap_db_backends as db_backends;

/// The types most programs need.
pub mod prelude {
    pub use relmap_core::logging::setup_logging;
    pub use relmap_core::{MapperSettings, RelmapError, RelmapResult, Settings, SETTINGS};
    pub use relmap_db::{
        build_column_list, build_join_clause, hydrate, Condition, CompositeKey, Hydrator,
        JoinMapper, JoinSpec, JoinSpecBuilder, JoinType, QueryExecutor, Record, RecordMap, Row,
        SelectRequest, TableMetadata, Value,
    };

    #[cfg(feature = "sqlite")]
    pub use relmap_db_backends::SqliteBackend;
}
