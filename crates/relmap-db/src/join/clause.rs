//! SQL generation for join specification trees.
//!
//! Two pure string-building passes over a [`JoinSpec`]:
//!
//! - [`build_join_clause`] emits the `JOIN`/`LEFT JOIN` chain linking every
//!   descendant to its parent, depth-first, parents before descendants. The
//!   root contributes nothing; it is the `FROM` table.
//! - [`build_column_list`] emits one `alias.field AS alias{sep}field` entry per
//!   selected field of every node, in the same depth-first order, so that
//!   same-named columns of different tables never collide in the flat row.
//!
//! Output depends only on the tree, so the same tree always yields
//! byte-identical SQL.

use super::spec::JoinSpec;
use crate::executor::{Condition, DatabaseBackendType, SelectRequest};
use crate::value::Value;
use relmap_core::settings::DEFAULT_COLUMN_SEPARATOR;

/// Builds the `JOIN` chain for every descendant of `spec`.
///
/// Each child contributes
/// `" <JOIN|LEFT JOIN> <table>[ AS <alias>] ON <parentAlias>.<parentField><op><childAlias>.<childField>"`
/// followed by its own descendants.
///
/// ```
/// use relmap_db::join::{build_join_clause, JoinSpec};
///
/// let comments = JoinSpec::builder("comments")
///     .alias("c")
///     .parent_field("id")
///     .child_field("post_id")
///     .build()
///     .unwrap();
/// let posts = JoinSpec::builder("posts").child("comments", comments).build().unwrap();
///
/// assert_eq!(
///     build_join_clause(&posts),
///     " LEFT JOIN comments AS c ON posts.id=c.post_id"
/// );
/// ```
pub fn build_join_clause(spec: &JoinSpec) -> String {
    let mut sql = String::new();
    push_join_clause(spec, &mut sql);
    sql
}

fn push_join_clause(spec: &JoinSpec, sql: &mut String) {
    let parent_alias = spec.alias();
    for (_, child) in spec.children() {
        sql.push(' ');
        sql.push_str(child.join_type().sql_keyword());
        sql.push(' ');
        sql.push_str(child.table_name());
        if let Some(alias) = child.table_alias() {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        sql.push_str(&format!(
            " ON {parent_alias}.{}{}{}.{}",
            child.parent_field().unwrap_or_default(),
            child.compare_operator(),
            child.alias(),
            child.child_field().unwrap_or_default(),
        ));
        push_join_clause(child, sql);
    }
}

/// Builds the alias-qualified column list for `spec` and its descendants,
/// using the separator configured on the tree or `"_T_"`.
pub fn build_column_list(spec: &JoinSpec) -> Vec<String> {
    build_column_list_with(spec, DEFAULT_COLUMN_SEPARATOR)
}

/// Builds the column list with `default_separator` for nodes that neither set
/// nor inherit a separator.
pub fn build_column_list_with(spec: &JoinSpec, default_separator: &str) -> Vec<String> {
    let mut columns = Vec::new();
    push_columns(spec, default_separator, &mut columns);
    columns
}

fn push_columns(spec: &JoinSpec, inherited: &str, columns: &mut Vec<String>) {
    let separator = spec.separator().unwrap_or(inherited);
    let alias = spec.alias();
    for field in spec.selected_fields() {
        columns.push(format!("{alias}.{field} AS {}", qualified_column(alias, separator, field)));
    }
    for (_, child) in spec.children() {
        push_columns(child, separator, columns);
    }
}

/// The flat-row column name of `field` on the table aliased `alias`.
pub fn qualified_column(alias: &str, separator: &str, field: &str) -> String {
    format!("{alias}{separator}{field}")
}

/// Assembles the executor request for `spec`.
pub fn build_select_request(
    spec: &JoinSpec,
    default_separator: &str,
    conditions: &[Condition],
) -> SelectRequest {
    SelectRequest {
        table: spec.table_name().to_string(),
        table_alias: spec.table_alias().map(str::to_string),
        join_clause: build_join_clause(spec),
        columns: build_column_list_with(spec, default_separator),
        conditions: conditions.to_vec(),
    }
}

/// Renders the complete `SELECT` for `spec` with the default separator.
pub fn build_select_sql(
    spec: &JoinSpec,
    conditions: &[Condition],
    backend: DatabaseBackendType,
) -> (String, Vec<Value>) {
    build_select_request(spec, DEFAULT_COLUMN_SEPARATOR, conditions).to_sql(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::spec::JoinType;

    fn blog_tree() -> JoinSpec {
        let avatar = JoinSpec::builder("images")
            .alias("avatar")
            .own_fields(["url"])
            .parent_field("avatar_id")
            .child_field("id")
            .join_type(JoinType::Inner)
            .build()
            .unwrap();
        let author = JoinSpec::builder("users")
            .alias("author")
            .own_fields(["name"])
            .parent_field("author_id")
            .child_field("id")
            .child("avatar", avatar)
            .build()
            .unwrap();
        let tags = JoinSpec::builder("tags")
            .own_fields(["label"])
            .id_fields(["post_id", "label"])
            .parent_field("id")
            .child_field("post_id")
            .build()
            .unwrap();
        JoinSpec::builder("posts")
            .own_fields(["id", "title"])
            .child("author", author)
            .child("tags", tags)
            .build()
            .unwrap()
    }

    #[test]
    fn test_root_without_children_has_no_join_clause() {
        let spec = JoinSpec::builder("posts").own_fields(["title"]).build().unwrap();
        assert_eq!(build_join_clause(&spec), "");
    }

    #[test]
    fn test_join_clause_depth_first() {
        assert_eq!(
            build_join_clause(&blog_tree()),
            " LEFT JOIN users AS author ON posts.author_id=author.id \
             JOIN images AS avatar ON author.avatar_id=avatar.id \
             LEFT JOIN tags ON posts.id=tags.post_id"
        );
    }

    #[test]
    fn test_join_clause_compare_operator() {
        let child = JoinSpec::builder("prices")
            .parent_field("valid_from")
            .child_field("starts_at")
            .compare_operator(" <= ")
            .build()
            .unwrap();
        let root = JoinSpec::builder("offers").child("price", child).build().unwrap();
        assert_eq!(
            build_join_clause(&root),
            " LEFT JOIN prices ON offers.valid_from <= prices.starts_at"
        );
    }

    #[test]
    fn test_column_list_order_and_aliases() {
        assert_eq!(
            build_column_list(&blog_tree()),
            vec![
                "posts.id AS posts_T_id",
                "posts.title AS posts_T_title",
                "author.name AS author_T_name",
                "author.id AS author_T_id",
                "avatar.url AS avatar_T_url",
                "avatar.id AS avatar_T_id",
                "tags.label AS tags_T_label",
                "tags.post_id AS tags_T_post_id",
            ]
        );
    }

    #[test]
    fn test_column_list_separator_inherited_and_overridden() {
        let leaf = JoinSpec::builder("c")
            .own_fields(["x"])
            .parent_field("id")
            .child_field("b_id")
            .build()
            .unwrap();
        let mid = JoinSpec::builder("b")
            .own_fields(["x"])
            .separator("__")
            .parent_field("id")
            .child_field("a_id")
            .child("c", leaf)
            .build()
            .unwrap();
        let root = JoinSpec::builder("a")
            .own_fields(["x"])
            .separator("$")
            .child("b", mid)
            .build()
            .unwrap();

        assert_eq!(
            build_column_list(&root),
            vec![
                "a.x AS a$x",
                "a.id AS a$id",
                "b.x AS b__x",
                "b.id AS b__id",
                "c.x AS c__x",
                "c.id AS c__id",
            ]
        );
    }

    #[test]
    fn test_column_list_with_default_separator() {
        let spec = JoinSpec::builder("t").own_fields(["id"]).build().unwrap();
        assert_eq!(build_column_list_with(&spec, "::"), vec!["t.id AS t::id"]);
    }

    #[test]
    fn test_output_is_stable() {
        let tree = blog_tree();
        assert_eq!(build_join_clause(&tree), build_join_clause(&tree));
        assert_eq!(build_column_list(&tree), build_column_list(&tree));
        assert_eq!(build_join_clause(&tree.clone()), build_join_clause(&blog_tree()));
    }

    #[test]
    fn test_build_select_sql() {
        let spec = JoinSpec::builder("posts")
            .alias("p")
            .own_fields(["title"])
            .build()
            .unwrap();
        let (sql, params) = build_select_sql(
            &spec,
            &[Condition::equals("p.id", 5)],
            DatabaseBackendType::SQLite,
        );
        assert_eq!(
            sql,
            "SELECT p.title AS p_T_title, p.id AS p_T_id FROM posts AS p WHERE p.id = ?"
        );
        assert_eq!(params, vec![Value::Int(5)]);
    }
}
