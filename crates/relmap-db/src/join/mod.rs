//! The join-mapping engine.
//!
//! - [`spec`] - [`JoinSpec`] trees describing a table and the tables joined to it
//! - [`clause`] - `JOIN` clause and qualified column list generation
//! - [`hydrate`] - folding flat joined rows back into nested records
//! - [`record`] - hydrated [`Record`]s and their [`CompositeKey`]s

pub mod clause;
pub mod hydrate;
pub mod record;
pub mod spec;

pub use clause::{
    build_column_list, build_column_list_with, build_join_clause, build_select_request,
    build_select_sql, qualified_column,
};
pub use hydrate::{hydrate, hydrate_into, Hydrator};
pub use record::{merge_record_maps, records_to_json, CompositeKey, Record, RecordMap};
pub use spec::{JoinSpec, JoinSpecBuilder, JoinType};
