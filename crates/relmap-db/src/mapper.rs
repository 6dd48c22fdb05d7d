//! The join mapper: one configured tree, queried and hydrated end to end.
//!
//! A [`JoinMapper`] is built once at application start from a [`JoinSpec`] and
//! [`MapperSettings`]. Each [`fetch`](JoinMapper::fetch) generates the select
//! for the tree, hands it to a [`QueryExecutor`], and hydrates the returned
//! rows into a fresh [`RecordMap`].

use relmap_core::settings::{MapperSettings, SETTINGS};
use relmap_core::{RelmapError, RelmapResult};

use crate::executor::{Condition, QueryExecutor, SelectRequest};
use crate::join::{
    build_column_list_with, build_join_clause, build_select_request, records_to_json, Hydrator,
    JoinSpec, RecordMap,
};
use crate::row::Row;

/// A join tree bound to its mapping settings.
#[derive(Debug, Clone)]
pub struct JoinMapper {
    spec: JoinSpec,
    settings: MapperSettings,
    hydrator: Hydrator,
}

impl JoinMapper {
    /// Creates a mapper using the globally configured settings, or the
    /// defaults when none were configured.
    pub fn new(spec: JoinSpec) -> Self {
        let settings = SETTINGS
            .try_get()
            .map(|s| s.mapper.clone())
            .unwrap_or_default();
        Self::with_settings(spec, settings)
    }

    /// Creates a mapper with explicit settings.
    pub fn with_settings(spec: JoinSpec, settings: MapperSettings) -> Self {
        let hydrator = Hydrator::new(&settings);
        Self {
            spec,
            settings,
            hydrator,
        }
    }

    /// The mapped join tree.
    pub fn spec(&self) -> &JoinSpec {
        &self.spec
    }

    /// The mapping settings.
    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    /// The generated `JOIN` chain.
    pub fn join_clause(&self) -> String {
        build_join_clause(&self.spec)
    }

    /// The generated qualified column list.
    pub fn column_list(&self) -> Vec<String> {
        build_column_list_with(&self.spec, &self.settings.column_separator)
    }

    /// The request handed to the executor for `conditions`.
    pub fn select_request(&self, conditions: &[Condition]) -> SelectRequest {
        build_select_request(&self.spec, &self.settings.column_separator, conditions)
    }

    /// Hydrates rows that were produced by this mapper's select.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if the rows lack id columns of the tree.
    pub fn hydrate(&self, rows: &[Row]) -> RelmapResult<RecordMap> {
        self.hydrator.hydrate(&self.spec, rows)
    }

    /// Runs the select through `executor` and hydrates the result.
    ///
    /// # Errors
    ///
    /// Propagates executor failures and hydration schema mismatches.
    pub async fn fetch(
        &self,
        executor: &dyn QueryExecutor,
        conditions: &[Condition],
    ) -> RelmapResult<RecordMap> {
        let request = self.select_request(conditions);
        tracing::debug!(
            table = self.spec.table_name(),
            joins = %request.join_clause,
            columns = request.columns.len(),
            "executing join select"
        );
        let rows = executor.select(&request).await?;
        self.hydrate(&rows)
    }

    /// Like [`fetch`](Self::fetch), rendered as JSON with the configured
    /// joint-data key.
    ///
    /// # Errors
    ///
    /// Propagates executor failures and hydration schema mismatches; keys
    /// that collide once rendered are `SerializationError`.
    pub async fn fetch_json(
        &self,
        executor: &dyn QueryExecutor,
        conditions: &[Condition],
    ) -> RelmapResult<serde_json::Value> {
        let records = self.fetch(executor, conditions).await?;
        records_to_json(&records, &self.settings.joint_data_key)
    }

    /// Like [`fetch_json`](Self::fetch_json), serialized to a string.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors; serialization failures are
    /// `SerializationError`.
    pub async fn fetch_json_string(
        &self,
        executor: &dyn QueryExecutor,
        conditions: &[Condition],
    ) -> RelmapResult<String> {
        let json = self.fetch_json(executor, conditions).await?;
        serde_json::to_string(&json).map_err(|e| RelmapError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::Mutex;

    struct RecordingExecutor {
        rows: Vec<Row>,
        seen: Mutex<Vec<SelectRequest>>,
    }

    #[async_trait::async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn select(&self, request: &SelectRequest) -> RelmapResult<Vec<Row>> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.rows.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait::async_trait]
    impl QueryExecutor for FailingExecutor {
        async fn select(&self, _request: &SelectRequest) -> RelmapResult<Vec<Row>> {
            Err(RelmapError::DatabaseError("connection reset".to_string()))
        }
    }

    fn mapper(settings: MapperSettings) -> JoinMapper {
        let comments = JoinSpec::builder("comments")
            .own_fields(["body"])
            .parent_field("id")
            .child_field("post_id")
            .build()
            .unwrap();
        let posts = JoinSpec::builder("posts")
            .own_fields(["title"])
            .child("comments", comments)
            .build()
            .unwrap();
        JoinMapper::with_settings(posts, settings)
    }

    #[test]
    fn test_column_list_uses_configured_separator() {
        let settings = MapperSettings {
            column_separator: "__".to_string(),
            ..MapperSettings::default()
        };
        assert_eq!(
            mapper(settings).column_list(),
            vec![
                "posts.title AS posts__title",
                "posts.id AS posts__id",
                "comments.body AS comments__body",
                "comments.id AS comments__id",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_passes_request_and_hydrates() {
        let executor = RecordingExecutor {
            rows: vec![
                Row::from_pairs([
                    ("posts_T_title", Value::from("Hello")),
                    ("posts_T_id", Value::Int(1)),
                    ("comments_T_body", Value::from("First!")),
                    ("comments_T_id", Value::Int(10)),
                ]),
                Row::from_pairs([
                    ("posts_T_title", Value::from("Hello")),
                    ("posts_T_id", Value::Int(1)),
                    ("comments_T_body", Value::from("Nice")),
                    ("comments_T_id", Value::Int(11)),
                ]),
            ],
            seen: Mutex::new(Vec::new()),
        };
        let mapper = mapper(MapperSettings::default());

        let conditions = [Condition::equals("posts.id", 1)];
        let records = mapper.fetch(&executor, &conditions).await.unwrap();

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].table, "posts");
        assert_eq!(seen[0].join_clause, " LEFT JOIN comments ON posts.id=comments.post_id");
        assert_eq!(seen[0].conditions, conditions.to_vec());

        assert_eq!(records.len(), 1);
        let post = records.values().next().unwrap();
        assert_eq!(post.children("comments").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_json_uses_joint_data_key() {
        let executor = RecordingExecutor {
            rows: vec![Row::from_pairs([
                ("posts_T_title", Value::from("Hello")),
                ("posts_T_id", Value::Int(1)),
                ("comments_T_body", Value::from("First!")),
                ("comments_T_id", Value::Int(10)),
            ])],
            seen: Mutex::new(Vec::new()),
        };
        let settings = MapperSettings {
            joint_data_key: "related".to_string(),
            ..MapperSettings::default()
        };

        let json = mapper(settings).fetch_json(&executor, &[]).await.unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "1": {"title": "Hello", "related": {"comments": {"10": {"body": "First!"}}}}
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_json_string() {
        let executor = RecordingExecutor {
            rows: vec![],
            seen: Mutex::new(Vec::new()),
        };
        let out = mapper(MapperSettings::default())
            .fetch_json_string(&executor, &[])
            .await
            .unwrap();
        assert_eq!(out, "{}");
    }

    #[tokio::test]
    async fn test_fetch_propagates_executor_error() {
        let err = mapper(MapperSettings::default())
            .fetch(&FailingExecutor, &[])
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("connection reset"));
    }
}
