//! SQLite backend using `rusqlite`.
//!
//! This module provides the [`SqliteBackend`] which implements
//! [`QueryExecutor`] and [`TableMetadata`] using `rusqlite` wrapped in
//! `tokio::task::spawn_blocking` for async compatibility.
//!
//! Features:
//! - In-memory database support via `:memory:` path (great for testing)
//! - Schema introspection through `pragma_table_info`
//! - Simple `Mutex`-based concurrency control

use relmap_core::{RelmapError, RelmapResult};
use relmap_db::executor::{DatabaseBackendType, QueryExecutor, SelectRequest, TableMetadata};
use relmap_db::{Row, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A SQLite database backend.
///
/// Uses `rusqlite` for database access with a `Mutex`-based concurrency
/// model. All statements run via `tokio::task::spawn_blocking` to avoid
/// blocking the async runtime.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError` if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> RelmapResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| RelmapError::OperationalError(format!("SQLite open failed: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| RelmapError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    ///
    /// # Errors
    ///
    /// Returns `OperationalError` if the database cannot be created.
    pub fn memory() -> RelmapResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Runs one or more `;`-separated statements without parameters, e.g. a
    /// schema script.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> RelmapResult<()> {
        let conn = self.conn.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute_batch(&sql)
                .map_err(|e| RelmapError::DatabaseError(format!("{e}")))
        })
        .await
        .map_err(|e| RelmapError::DatabaseError(format!("Task join error: {e}")))?
    }

    /// Runs a parameterized query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the statement cannot be prepared, bound,
    /// or stepped.
    pub async fn query(&self, sql: &str, params: &[Value]) -> RelmapResult<Vec<Row>> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| RelmapError::DatabaseError(format!("{e}")))?;

            let column_names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows
                .next()
                .map_err(|e| RelmapError::DatabaseError(format!("{e}")))?
            {
                rows.push(Self::convert_row(row, &column_names));
            }

            Ok(rows)
        })
        .await
        .map_err(|e| RelmapError::DatabaseError(format!("Task join error: {e}")))?
    }

    /// Binds relmap `Value`s to a `rusqlite` statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> RelmapResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
                Value::Date(d) => stmt.raw_bind_parameter(idx, d.to_string().as_str()),
                Value::DateTime(dt) => stmt.raw_bind_parameter(idx, dt.to_string().as_str()),
                Value::Uuid(u) => stmt.raw_bind_parameter(idx, u.to_string().as_str()),
                Value::Json(j) => stmt.raw_bind_parameter(idx, j.to_string().as_str()),
            }
            .map_err(|e| RelmapError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to our generic `Row`.
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        let values: Vec<Value> = (0..column_names.len())
            .map(|i| {
                match sqlite_row
                    .get_ref(i)
                    .unwrap_or(rusqlite::types::ValueRef::Null)
                {
                    rusqlite::types::ValueRef::Null => Value::Null,
                    rusqlite::types::ValueRef::Integer(v) => Value::Int(v),
                    rusqlite::types::ValueRef::Real(v) => Value::Float(v),
                    rusqlite::types::ValueRef::Text(b) => {
                        Value::String(String::from_utf8_lossy(b).to_string())
                    }
                    rusqlite::types::ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
                }
            })
            .collect();

        Row::new(column_names.to_vec(), values)
    }

    /// `(name, pk position)` for every column of `table`, in declaration order.
    async fn table_info(&self, table: &str) -> RelmapResult<Vec<(String, i64)>> {
        let rows = self
            .query(
                "SELECT name, pk FROM pragma_table_info(?) ORDER BY cid",
                &[Value::from(table)],
            )
            .await?;
        if rows.is_empty() {
            return Err(RelmapError::ConfigurationError(format!(
                "Table '{table}' does not exist"
            )));
        }
        rows.iter()
            .map(|row| Ok((row.get::<String>("name")?, row.get::<i64>("pk")?)))
            .collect()
    }
}

#[async_trait::async_trait]
impl QueryExecutor for SqliteBackend {
    async fn select(&self, request: &SelectRequest) -> RelmapResult<Vec<Row>> {
        let (sql, params) = request.to_sql(DatabaseBackendType::SQLite);
        tracing::trace!(%sql, params = params.len(), "sqlite select");
        self.query(&sql, &params).await
    }
}

#[async_trait::async_trait]
impl TableMetadata for SqliteBackend {
    async fn field_names(&self, table: &str) -> RelmapResult<Vec<String>> {
        Ok(self
            .table_info(table)
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    async fn primary_key_names(&self, table: &str) -> RelmapResult<Vec<String>> {
        let mut keys: Vec<(String, i64)> = self
            .table_info(table)
            .await?
            .into_iter()
            .filter(|(_, pk)| *pk > 0)
            .collect();
        keys.sort_by_key(|(_, pk)| *pk);
        Ok(keys.into_iter().map(|(name, _)| name).collect())
    }
}
