//! Flat result rows.
//!
//! A [`Row`] is one line of a joined SQL result: the alias-qualified column
//! names produced by the clause builder and the values the executor returned
//! for them. Rows are the input of the hydrator.

use crate::value::Value;
use relmap_core::RelmapError;

/// A generic database row passed from an executor to the hydrator.
///
/// `Row` holds a list of column names and their corresponding values. It
/// provides typed access via the [`get`](Row::get) method.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Creates a row from `(column, value)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use relmap_db::{Row, Value};
    ///
    /// let row = Row::from_pairs([("id", Value::Int(1)), ("name", Value::from("a"))]);
    /// assert_eq!(row.len(), 2);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns `true` if the row carries the given column (even if NULL).
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, RelmapError> {
        let value = self.get_value(column).ok_or_else(|| {
            RelmapError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw Value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, RelmapError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(RelmapError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        match value {
            Value::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as f64),
            _ => Err(RelmapError::DatabaseError(format!(
                "Expected Float, got {value:?}"
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(RelmapError::DatabaseError(format!(
                "Expected Bool, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(RelmapError::DatabaseError(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, RelmapError> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_typed() {
        let row = Row::from_pairs([
            ("name", Value::from("Alice")),
            ("id", Value::Int(42)),
            ("active", Value::Int(1)),
        ]);
        assert_eq!(row.get::<String>("name").unwrap(), "Alice");
        assert_eq!(row.get::<i64>("id").unwrap(), 42);
        assert!(row.get::<bool>("active").unwrap());
    }

    #[test]
    fn test_row_get_optional_none() {
        let row = Row::new(vec!["bio".to_string()], vec![Value::Null]);
        let bio: Option<String> = row.get("bio").unwrap();
        assert_eq!(bio, None);
    }

    #[test]
    fn test_row_get_missing_column() {
        let row = Row::from_pairs([("name", "test")]);
        assert!(row.get::<String>("missing").is_err());
        assert!(row.get::<i64>("name").is_err());
    }

    #[test]
    fn test_row_contains_null_column() {
        let row = Row::from_pairs([("x", Value::Null)]);
        assert!(row.contains("x"));
        assert!(!row.contains("y"));
        assert_eq!(row.get_value("x"), Some(&Value::Null));
        assert_eq!(row.get_value("y"), None);
    }

    #[test]
    fn test_row_columns() {
        let row = Row::new(
            vec!["a".to_string(), "b".to_string()],
            vec![Value::Int(1), Value::Int(2)],
        );
        assert_eq!(row.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
        assert!(Row::new(vec![], vec![]).is_empty());
    }

    #[test]
    #[should_panic(expected = "column count must match")]
    fn test_row_new_mismatch_panics() {
        let _ = Row::new(vec!["a".to_string()], vec![]);
    }
}
