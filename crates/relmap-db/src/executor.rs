//! Query executor and table metadata seams.
//!
//! relmap never talks to a database itself. A [`QueryExecutor`] receives the
//! pieces the clause builder generated (root table, `JOIN` chain, qualified
//! column list, conditions) as a [`SelectRequest`] and returns flat [`Row`]s.
//! A [`TableMetadata`] provider supplies field and primary-key names so join
//! specifications can be derived from the live schema.
//!
//! Backends implement both traits in the `relmap-db-backends` crate.

use crate::row::Row;
use crate::value::Value;
use relmap_core::RelmapResult;

/// Placeholder style used when a [`SelectRequest`] is rendered to SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    PostgreSQL,
    /// SQLite (uses `?` placeholders).
    SQLite,
    /// MySQL (uses `?` placeholders).
    MySQL,
}

impl DatabaseBackendType {
    /// Returns a parameter placeholder for the given 1-based index.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${index}"),
            Self::SQLite | Self::MySQL => "?".to_string(),
        }
    }
}

/// An equality filter on an alias-qualified column (`posts.id`).
///
/// A `Null` value renders as `IS NULL` and binds no parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The qualified column, e.g. `posts.author_id`.
    pub column: String,
    /// The value to compare against.
    pub value: Value,
}

impl Condition {
    /// Creates an equality condition.
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Everything an executor needs to run one joined select.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    /// The root (`FROM`) table.
    pub table: String,
    /// The root table's alias, when it differs from the table name.
    pub table_alias: Option<String>,
    /// The generated `JOIN` chain (starts with a space, or is empty).
    pub join_clause: String,
    /// The generated `alias.field AS alias{sep}field` column list.
    pub columns: Vec<String>,
    /// Filters combined with `AND`.
    pub conditions: Vec<Condition>,
}

impl SelectRequest {
    /// Renders the request as a parameterized `SELECT` statement.
    ///
    /// ```
    /// use relmap_db::executor::{Condition, DatabaseBackendType, SelectRequest};
    ///
    /// let request = SelectRequest {
    ///     table: "posts".into(),
    ///     table_alias: None,
    ///     join_clause: String::new(),
    ///     columns: vec!["posts.id AS posts_T_id".into()],
    ///     conditions: vec![Condition::equals("posts.id", 7)],
    /// };
    /// let (sql, params) = request.to_sql(DatabaseBackendType::PostgreSQL);
    /// assert_eq!(sql, "SELECT posts.id AS posts_T_id FROM posts WHERE posts.id = $1");
    /// assert_eq!(params.len(), 1);
    /// ```
    pub fn to_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from("SELECT ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        if let Some(alias) = self.table_alias.as_deref() {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        sql.push_str(&self.join_clause);

        if !self.conditions.is_empty() {
            let parts: Vec<String> = self
                .conditions
                .iter()
                .map(|cond| {
                    if cond.value.is_null() {
                        format!("{} IS NULL", cond.column)
                    } else {
                        params.push(cond.value.clone());
                        format!("{} = {}", cond.column, backend.placeholder(params.len()))
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        (sql, params)
    }
}

/// Runs joined selects on behalf of a [`JoinMapper`](crate::mapper::JoinMapper).
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes the select and returns every result row, columns named by
    /// their generated aliases.
    async fn select(&self, request: &SelectRequest) -> RelmapResult<Vec<Row>>;
}

/// Supplies per-table field and primary-key names.
#[async_trait::async_trait]
pub trait TableMetadata: Send + Sync {
    /// All field (column) names of `table`, in declaration order.
    async fn field_names(&self, table: &str) -> RelmapResult<Vec<String>>;

    /// The primary-key field names of `table`, in key order. Empty when the
    /// table declares none.
    async fn primary_key_names(&self, table: &str) -> RelmapResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn QueryExecutor, _: &dyn TableMetadata) {}

    fn request() -> SelectRequest {
        SelectRequest {
            table: "posts".to_string(),
            table_alias: Some("p".to_string()),
            join_clause: " LEFT JOIN comments ON p.id=comments.post_id".to_string(),
            columns: vec![
                "p.title AS p_T_title".to_string(),
                "comments.body AS comments_T_body".to_string(),
            ],
            conditions: vec![],
        }
    }

    #[test]
    fn test_to_sql_without_conditions() {
        let (sql, params) = request().to_sql(DatabaseBackendType::SQLite);
        assert_eq!(
            sql,
            "SELECT p.title AS p_T_title, comments.body AS comments_T_body \
             FROM posts AS p LEFT JOIN comments ON p.id=comments.post_id"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_to_sql_pg_param_numbering() {
        let mut req = request();
        req.conditions = vec![
            Condition::equals("p.author_id", 3),
            Condition::equals("p.deleted_at", Value::Null),
            Condition::equals("p.status", "published"),
        ];
        let (sql, params) = req.to_sql(DatabaseBackendType::PostgreSQL);
        assert!(sql.ends_with(
            " WHERE p.author_id = $1 AND p.deleted_at IS NULL AND p.status = $2"
        ));
        assert_eq!(params, vec![Value::Int(3), Value::from("published")]);
    }

    #[test]
    fn test_to_sql_question_marks() {
        let mut req = request();
        req.conditions = vec![Condition::equals("p.a", 1), Condition::equals("p.b", 2)];
        let (sql, _) = req.to_sql(DatabaseBackendType::MySQL);
        assert!(sql.ends_with(" WHERE p.a = ? AND p.b = ?"));
    }

    #[test]
    fn test_to_sql_empty_columns_selects_star() {
        let req = SelectRequest {
            table: "t".to_string(),
            table_alias: None,
            join_clause: String::new(),
            columns: vec![],
            conditions: vec![],
        };
        assert_eq!(req.to_sql(DatabaseBackendType::SQLite).0, "SELECT * FROM t");
    }
}
