//! Rebuilding nested records from flat joined rows.
//!
//! Executing the SQL produced by the [clause builder](super::clause) yields one
//! flat row per leaf combination: a parent with three children arrives as
//! three rows repeating the parent's columns. The [`Hydrator`] walks every row
//! down the [`JoinSpec`] tree and folds it into a [`RecordMap`]:
//!
//! 1. At each node, the id-field values are read from the row. If every one
//!    is NULL, the (outer-joined) branch found nothing for this row and the
//!    node and its subtree are skipped.
//! 2. Otherwise the composite key is derived. The first row producing a key
//!    creates the record from its own-field values; later rows with the same
//!    key leave those values alone.
//! 3. The same row is folded into each child's map under the record's joint
//!    data, merging with children contributed by earlier rows. A join that
//!    ends up with no records is not attached at all.
//!
//! Because records are only ever created once per key and child maps are
//! merged, the result does not depend on row order.
//!
//! Columns are read by their qualified name, `alias{sep}field`. Rows built by
//! hand may use bare field names instead; a bare column is only accepted for a
//! field that no other node of the tree selects, since otherwise it cannot be
//! attributed to one table.

use std::collections::HashSet;

use relmap_core::logging::hydration_span;
use relmap_core::settings::MapperSettings;
use relmap_core::{RelmapError, RelmapResult};

use super::clause::qualified_column;
use super::record::{CompositeKey, Record, RecordMap};
use super::spec::JoinSpec;
use crate::row::Row;
use crate::value::Value;

static NULL: Value = Value::Null;

/// Folds flat rows into nested records.
///
/// A hydrator is immutable configuration; every call builds a fresh map.
#[derive(Debug, Clone)]
pub struct Hydrator {
    separator: String,
    accept_unqualified_columns: bool,
}

impl Default for Hydrator {
    fn default() -> Self {
        Self::new(&MapperSettings::default())
    }
}

impl Hydrator {
    /// Creates a hydrator using the separator and column fallback from
    /// `settings`.
    pub fn new(settings: &MapperSettings) -> Self {
        Self {
            separator: settings.column_separator.clone(),
            accept_unqualified_columns: settings.accept_unqualified_columns,
        }
    }

    /// Hydrates `rows` into a new map keyed by the root's composite keys.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if a row carries none of a visited node's
    /// id-field columns.
    pub fn hydrate(&self, spec: &JoinSpec, rows: &[Row]) -> RelmapResult<RecordMap> {
        self.hydrate_into(spec, rows, RecordMap::new())
    }

    /// Hydrates `rows` on top of `existing`, with the same first-wins and
    /// merge-children rules applied against records already in the map.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if a row carries none of a visited node's
    /// id-field columns. The partially built map is discarded.
    pub fn hydrate_into(
        &self,
        spec: &JoinSpec,
        rows: &[Row],
        existing: RecordMap,
    ) -> RelmapResult<RecordMap> {
        let span = hydration_span(spec.table_name());
        let _guard = span.enter();

        let shared = if self.accept_unqualified_columns {
            shared_field_names(spec)
        } else {
            HashSet::new()
        };

        let mut records = existing;
        for row in rows {
            self.absorb_row(spec, &self.separator, row, &shared, &mut records)?;
        }

        tracing::debug!(rows = rows.len(), records = records.len(), "hydration finished");
        Ok(records)
    }

    fn absorb_row(
        &self,
        spec: &JoinSpec,
        inherited_separator: &str,
        row: &Row,
        shared: &HashSet<&str>,
        records: &mut RecordMap,
    ) -> RelmapResult<()> {
        let separator = spec.separator().unwrap_or(inherited_separator);
        let alias = spec.alias();

        let mut ids: Vec<&Value> = Vec::with_capacity(spec.id_fields().len());
        let mut any_id_column = false;
        for field in spec.id_fields() {
            match self.lookup(row, alias, separator, field, shared) {
                Some(value) => {
                    any_id_column = true;
                    ids.push(value);
                }
                None => ids.push(&NULL),
            }
        }
        if !any_id_column {
            let mut message = format!(
                "row has none of the id columns [{}] of table '{}'",
                spec.id_fields()
                    .iter()
                    .map(|f| qualified_column(alias, separator, f))
                    .collect::<Vec<_>>()
                    .join(", "),
                spec.table_name()
            );
            let ambiguous: Vec<&str> = spec
                .id_fields()
                .iter()
                .map(String::as_str)
                .filter(|f| shared.contains(f) && row.contains(f))
                .collect();
            if !ambiguous.is_empty() {
                message.push_str(&format!(
                    "; bare columns [{}] are selected by more than one table and were not used",
                    ambiguous.join(", ")
                ));
            }
            return Err(RelmapError::SchemaMismatch(message));
        }
        if ids.iter().all(|v| v.is_null()) {
            tracing::trace!(table = spec.table_name(), alias, "no match for optional branch");
            return Ok(());
        }

        let key = CompositeKey::from_values(&ids);
        let record = records.entry(key).or_insert_with(|| {
            Record::new(
                spec.own_fields()
                    .iter()
                    .map(|field| {
                        let value = self
                            .lookup(row, alias, separator, field, shared)
                            .unwrap_or(&NULL);
                        (field.clone(), value.clone())
                    })
                    .collect(),
            )
        });

        for (join, child) in spec.children() {
            let mut children = record.joint_data.remove(join).unwrap_or_default();
            self.absorb_row(child, separator, row, shared, &mut children)?;
            if !children.is_empty() {
                record.joint_data.insert(join.to_string(), children);
            }
        }
        Ok(())
    }

    fn lookup<'r>(
        &self,
        row: &'r Row,
        alias: &str,
        separator: &str,
        field: &str,
        shared: &HashSet<&str>,
    ) -> Option<&'r Value> {
        row.get_value(&qualified_column(alias, separator, field))
            .or_else(|| {
                if self.accept_unqualified_columns && !shared.contains(field) {
                    row.get_value(field)
                } else {
                    None
                }
            })
    }
}

/// Field names selected by more than one node of the tree.
fn shared_field_names(spec: &JoinSpec) -> HashSet<&str> {
    let mut seen = HashSet::new();
    let mut shared = HashSet::new();
    collect_shared(spec, &mut seen, &mut shared);
    shared
}

fn collect_shared<'a>(spec: &'a JoinSpec, seen: &mut HashSet<&'a str>, shared: &mut HashSet<&'a str>) {
    for field in spec.selected_fields() {
        if !seen.insert(field) {
            shared.insert(field);
        }
    }
    for (_, child) in spec.children() {
        collect_shared(child, seen, shared);
    }
}

/// Hydrates `rows` with default settings.
///
/// # Errors
///
/// See [`Hydrator::hydrate`].
pub fn hydrate(spec: &JoinSpec, rows: &[Row]) -> RelmapResult<RecordMap> {
    Hydrator::default().hydrate(spec, rows)
}

/// Hydrates `rows` on top of `existing` with default settings.
///
/// # Errors
///
/// See [`Hydrator::hydrate_into`].
pub fn hydrate_into(spec: &JoinSpec, rows: &[Row], existing: RecordMap) -> RelmapResult<RecordMap> {
    Hydrator::default().hydrate_into(spec, rows, existing)
}
