//! End-to-end tests against an in-memory SQLite database.
//!
//! These tests verify the complete round-trip: join specifications derived
//! from the live schema, SQL generation, execution on a real database, and
//! hydration of the outer-joined rows into nested records.

#![cfg(feature = "sqlite")]

use relmap_core::MapperSettings;
use relmap_db::executor::Condition;
use relmap_db::{CompositeKey, JoinMapper, JoinSpec, JoinSpecBuilder, JoinType, Value};
use relmap_db_backends::SqliteBackend;
use serde_json::json;

const SCHEMA: &str = "
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE posts (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        author_id INTEGER REFERENCES users(id)
    );
    CREATE TABLE comments (
        id INTEGER PRIMARY KEY,
        post_id INTEGER NOT NULL REFERENCES posts(id),
        user_id INTEGER REFERENCES users(id),
        body TEXT
    );
    CREATE TABLE tags (
        post_id INTEGER NOT NULL REFERENCES posts(id),
        label TEXT NOT NULL,
        PRIMARY KEY (post_id, label)
    );

    INSERT INTO users VALUES (1, 'alice'), (2, 'bob');
    INSERT INTO posts VALUES (10, 'Hello', 1), (11, 'Draft', NULL), (12, 'Quiet', 2);
    INSERT INTO comments VALUES
        (100, 10, 2, 'Nice post'),
        (101, 10, 1, 'Thanks'),
        (102, 11, NULL, 'Anonymous');
    INSERT INTO tags VALUES (10, 'intro'), (10, 'rust'), (12, 'misc');
";

async fn backend() -> SqliteBackend {
    let backend = SqliteBackend::memory().unwrap();
    backend.execute_batch(SCHEMA).await.unwrap();
    backend
}

fn blog_mapper() -> JoinMapper {
    let commenter = JoinSpec::builder("users")
        .alias("commenter")
        .own_fields(["name"])
        .parent_field("user_id")
        .child_field("id")
        .build()
        .unwrap();
    let comments = JoinSpec::builder("comments")
        .own_fields(["body"])
        .parent_field("id")
        .child_field("post_id")
        .child("commenter", commenter)
        .build()
        .unwrap();
    let author = JoinSpec::builder("users")
        .alias("author")
        .own_fields(["name"])
        .parent_field("author_id")
        .child_field("id")
        .build()
        .unwrap();
    let tags = JoinSpec::builder("tags")
        .own_fields(["label"])
        .id_fields(["post_id", "label"])
        .parent_field("id")
        .child_field("post_id")
        .build()
        .unwrap();
    let posts = JoinSpec::builder("posts")
        .own_fields(["title"])
        .child("author", author)
        .child("comments", comments)
        .child("tags", tags)
        .build()
        .unwrap();
    JoinMapper::with_settings(posts, MapperSettings::default())
}

#[tokio::test]
async fn test_fetch_nested_blog() {
    let backend = backend().await;
    let posts = blog_mapper().fetch(&backend, &[]).await.unwrap();

    assert_eq!(posts.len(), 3);

    let hello = &posts[&CompositeKey::from(10)];
    assert_eq!(hello.get("title"), Some(&Value::from("Hello")));
    assert_eq!(
        hello.children("author").unwrap()[&CompositeKey::from(1)].get("name"),
        Some(&Value::from("alice"))
    );

    // Two comments times two tags: four rows folded into one post.
    let comments = hello.children("comments").unwrap();
    assert_eq!(comments.len(), 2);
    let first = &comments[&CompositeKey::from(100)];
    assert_eq!(
        first.children("commenter").unwrap()[&CompositeKey::from(2)].get("name"),
        Some(&Value::from("bob"))
    );
    let tags: Vec<String> = hello
        .children("tags")
        .unwrap()
        .keys()
        .map(ToString::to_string)
        .collect();
    assert_eq!(tags, vec!["10_intro", "10_rust"]);

    // No author, anonymous comment, no tags.
    let draft = &posts[&CompositeKey::from(11)];
    assert!(draft.children("author").is_none());
    assert!(draft.children("tags").is_none());
    let anonymous = &draft.children("comments").unwrap()[&CompositeKey::from(102)];
    assert!(!anonymous.has_joint_data());
}

#[tokio::test]
async fn test_fetch_json_with_condition() {
    let backend = backend().await;
    let json = blog_mapper()
        .fetch_json(&backend, &[Condition::equals("posts.id", 12)])
        .await
        .unwrap();

    assert_eq!(
        json,
        json!({
            "12": {
                "title": "Quiet",
                "joint_data": {
                    "author": {"2": {"name": "bob"}},
                    "tags": {"12_misc": {"label": "misc"}}
                }
            }
        })
    );
}

#[tokio::test]
async fn test_inner_join_drops_unmatched_roots() {
    let backend = backend().await;
    let author = JoinSpec::builder("users")
        .alias("author")
        .own_fields(["name"])
        .parent_field("author_id")
        .child_field("id")
        .join_type(JoinType::Inner)
        .build()
        .unwrap();
    let posts = JoinSpec::builder("posts")
        .own_fields(["title"])
        .child("author", author)
        .build()
        .unwrap();

    let records = JoinMapper::with_settings(posts, MapperSettings::default())
        .fetch(&backend, &[])
        .await
        .unwrap();
    let keys: Vec<String> = records.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["10", "12"]);
}

#[tokio::test]
async fn test_spec_from_metadata() {
    let backend = backend().await;
    let tags = JoinSpecBuilder::from_metadata(&backend, "tags")
        .await
        .unwrap()
        .parent_field("id")
        .child_field("post_id")
        .build()
        .unwrap();
    assert_eq!(tags.own_fields(), &["post_id".to_string(), "label".to_string()]);
    assert_eq!(tags.id_fields(), &["post_id".to_string(), "label".to_string()]);

    let posts = JoinSpecBuilder::from_metadata(&backend, "posts")
        .await
        .unwrap()
        .child("tags", tags)
        .build()
        .unwrap();
    assert_eq!(posts.id_fields(), &["id".to_string()]);

    let records = JoinMapper::with_settings(posts, MapperSettings::default())
        .fetch(&backend, &[Condition::equals("posts.id", 10)])
        .await
        .unwrap();
    let post = &records[&CompositeKey::from(10)];
    assert_eq!(post.get("author_id"), Some(&Value::Int(1)));
    assert_eq!(post.children("tags").unwrap().len(), 2);
}

#[tokio::test]
async fn test_custom_separator_round_trips() {
    let backend = backend().await;
    let settings = MapperSettings {
        column_separator: "__".to_string(),
        ..MapperSettings::default()
    };
    let tags = JoinSpec::builder("tags")
        .own_fields(["label"])
        .id_fields(["post_id", "label"])
        .parent_field("id")
        .child_field("post_id")
        .build()
        .unwrap();
    let posts = JoinSpec::builder("posts")
        .own_fields(["title"])
        .child("tags", tags)
        .build()
        .unwrap();
    let mapper = JoinMapper::with_settings(posts, settings);
    assert!(mapper.column_list().contains(&"tags.label AS tags__label".to_string()));

    let records = mapper.fetch(&backend, &[]).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[&CompositeKey::from(10)].children("tags").unwrap().len(), 2);
}
