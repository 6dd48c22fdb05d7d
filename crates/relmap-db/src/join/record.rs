//! Hydrated records and their identity keys.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;
use relmap_core::{RelmapError, RelmapResult};

/// Separator between values of a multi-field key (`"1_a"`).
pub const KEY_SEPARATOR: &str = "_";

/// The identity of one logical row at one node of a join tree.
///
/// A single id field keeps its raw value and type; several id fields are
/// concatenated as strings with `"_"` between them, a NULL part contributing
/// the empty string.
#[derive(Debug, Clone)]
pub enum CompositeKey {
    /// Key of a node with exactly one id field.
    Single(Value),
    /// Key of a node with several id fields.
    Joined(String),
}

impl CompositeKey {
    /// Derives the key from id-field values in id-field order.
    pub fn from_values(values: &[&Value]) -> Self {
        match values {
            [single] => Self::Single((*single).clone()),
            _ => Self::Joined(
                values
                    .iter()
                    .map(|v| if v.is_null() { String::new() } else { v.to_string() })
                    .collect::<Vec<_>>()
                    .join(KEY_SEPARATOR),
            ),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Single(Value::Null) => 0,
            Self::Single(Value::Bool(_)) => 1,
            Self::Single(Value::Int(_)) => 2,
            Self::Single(Value::Float(_)) => 3,
            Self::Single(Value::String(_)) => 4,
            Self::Single(Value::Bytes(_)) => 5,
            Self::Single(Value::Date(_)) => 6,
            Self::Single(Value::DateTime(_)) => 7,
            Self::Single(Value::Uuid(_)) => 8,
            Self::Single(Value::Json(_)) => 9,
            Self::Joined(_) => 10,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => write!(f, "{v}"),
            Self::Joined(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for CompositeKey {
    fn from(v: i64) -> Self {
        Self::Single(Value::Int(v))
    }
}

impl From<&str> for CompositeKey {
    fn from(v: &str) -> Self {
        Self::Single(Value::from(v))
    }
}

// Keys of different value types never compare equal: Int(1) and String("1")
// are distinct identities.
impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
            (Self::Single(Value::Bool(a)), Self::Single(Value::Bool(b))) => a.cmp(b),
            (Self::Single(Value::Int(a)), Self::Single(Value::Int(b))) => a.cmp(b),
            (Self::Single(Value::Float(a)), Self::Single(Value::Float(b))) => a.total_cmp(b),
            (Self::Single(Value::Bytes(a)), Self::Single(Value::Bytes(b))) => a.cmp(b),
            (Self::Single(Value::Date(a)), Self::Single(Value::Date(b))) => a.cmp(b),
            (Self::Single(Value::DateTime(a)), Self::Single(Value::DateTime(b))) => a.cmp(b),
            (Self::Single(Value::Uuid(a)), Self::Single(Value::Uuid(b))) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        })
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CompositeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompositeKey {}

/// Hydrated records of one tree node, keyed by composite key.
pub type RecordMap = BTreeMap<CompositeKey, Record>;

/// One deduplicated row of one table, with its joined children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub(crate) fields: Vec<(String, Value)>,
    pub(crate) joint_data: BTreeMap<String, RecordMap>,
}

impl Record {
    /// Creates a record with the given own-field values and no children.
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self {
            fields,
            joint_data: BTreeMap::new(),
        }
    }

    /// Own-field values in field order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Looks up an own-field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Child records grouped by join name. Joins that matched nothing for
    /// this record are absent.
    pub fn joint_data(&self) -> &BTreeMap<String, RecordMap> {
        &self.joint_data
    }

    /// Child records of one join.
    pub fn children(&self, join: &str) -> Option<&RecordMap> {
        self.joint_data.get(join)
    }

    /// Returns `true` if at least one join produced a child record.
    pub fn has_joint_data(&self) -> bool {
        !self.joint_data.is_empty()
    }

    /// Renders the record as a JSON object: own fields, plus
    /// `joint_data_key: { join: { key: record } }` when children exist.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if an own field is named like
    /// `joint_data_key`, or if child keys collide once rendered (see
    /// [`records_to_json`]).
    pub fn to_json(&self, joint_data_key: &str) -> RelmapResult<serde_json::Value> {
        let mut object: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        if self.has_joint_data() {
            let mut joints = serde_json::Map::new();
            for (join, records) in &self.joint_data {
                joints.insert(join.clone(), records_to_json(records, joint_data_key)?);
            }
            if object.contains_key(joint_data_key) {
                return Err(RelmapError::SerializationError(format!(
                    "Own field '{joint_data_key}' clashes with the joint data key"
                )));
            }
            object.insert(joint_data_key.to_string(), serde_json::Value::Object(joints));
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// Renders a record map as a JSON object keyed by each key's display form.
///
/// JSON object keys are strings, so keys that differ only in type (`Int(1)`
/// and `String("1")`) render alike.
///
/// # Errors
///
/// Returns `SerializationError` when two keys render to the same string.
pub fn records_to_json(records: &RecordMap, joint_data_key: &str) -> RelmapResult<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for (key, record) in records {
        let rendered = key.to_string();
        if object.contains_key(&rendered) {
            return Err(RelmapError::SerializationError(format!(
                "Record keys collide as JSON object key '{rendered}'"
            )));
        }
        object.insert(rendered, record.to_json(joint_data_key)?);
    }
    Ok(serde_json::Value::Object(object))
}

/// Merges `from` into `into` with hydration semantics: a key already present
/// keeps its own-field values, and child maps are merged rather than replaced.
///
/// Hydrating disjoint partitions of a row set and merging the results yields
/// the same map as hydrating the whole set at once.
pub fn merge_record_maps(into: &mut RecordMap, from: RecordMap) {
    for (key, record) in from {
        match into.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                for (join, children) in record.joint_data {
                    merge_record_maps(existing.joint_data.entry(join).or_default(), children);
                }
            }
        }
    }
}
