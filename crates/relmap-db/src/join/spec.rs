//! Join specification trees.
//!
//! A [`JoinSpec`] describes one table of a joined query: which of its fields
//! end up in the hydrated record, which fields identify one logical row, how
//! it attaches to its parent in SQL, and which tables are joined below it.
//! Trees are assembled bottom-up (children are complete before they are
//! attached) and are read-only once handed to the clause builder or the
//! hydrator.

use crate::executor::TableMetadata;
use relmap_core::{RelmapError, RelmapResult};

/// The identity field used when none is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// SQL join types supported by the clause builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// `JOIN` (inner join).
    Inner,
    /// `LEFT JOIN` (outer join; the child branch may be all NULL).
    #[default]
    Left,
}

impl JoinType {
    /// Returns the SQL keyword for this join type.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
        }
    }

    /// Parses a join keyword (`JOIN`, `INNER JOIN`, `LEFT JOIN`,
    /// `LEFT OUTER JOIN`), ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for any other keyword.
    pub fn parse(keyword: &str) -> RelmapResult<Self> {
        let normalized = keyword
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match normalized.as_str() {
            "JOIN" | "INNER JOIN" => Ok(Self::Inner),
            "LEFT JOIN" | "LEFT OUTER JOIN" => Ok(Self::Left),
            _ => Err(RelmapError::ConfigurationError(format!(
                "Unsupported join type '{keyword}'"
            ))),
        }
    }
}

/// One node of a join specification tree.
///
/// # Examples
///
/// ```
/// use relmap_db::join::{JoinSpec, JoinType};
///
/// let comments = JoinSpec::builder("comments")
///     .own_fields(["body"])
///     .parent_field("id")
///     .child_field("post_id")
///     .build()
///     .unwrap();
///
/// let posts = JoinSpec::builder("posts")
///     .own_fields(["title"])
///     .child("comments", comments)
///     .build()
///     .unwrap();
///
/// assert_eq!(posts.alias(), "posts");
/// assert_eq!(posts.child("comments").unwrap().join_type(), JoinType::Left);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    table_name: String,
    table_alias: Option<String>,
    own_fields: Vec<String>,
    id_fields: Vec<String>,
    parent_field: Option<String>,
    child_field: Option<String>,
    compare_operator: String,
    join_type: JoinType,
    separator: Option<String>,
    children: Vec<(String, JoinSpec)>,
}

impl JoinSpec {
    /// Creates a node for `table` with every other attribute defaulted:
    /// id field `"id"`, no own fields, no children, `LEFT JOIN`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the table name is empty.
    pub fn new(table: impl Into<String>) -> RelmapResult<Self> {
        Self::builder(table).build()
    }

    /// Starts building a node for `table`.
    pub fn builder(table: impl Into<String>) -> JoinSpecBuilder {
        JoinSpecBuilder::new(table)
    }

    /// The table name, as used in the `FROM`/`JOIN` clause.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The explicit alias, if one was configured.
    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// The alias that qualifies this table's columns: the configured alias,
    /// or the table name.
    pub fn alias(&self) -> &str {
        self.table_alias.as_deref().unwrap_or(&self.table_name)
    }

    /// Fields copied into the hydrated record, in order.
    pub fn own_fields(&self) -> &[String] {
        &self.own_fields
    }

    /// Fields whose values form the composite identity key.
    pub fn id_fields(&self) -> &[String] {
        &self.id_fields
    }

    /// The parent's column referenced in the `ON` condition.
    pub fn parent_field(&self) -> Option<&str> {
        self.parent_field.as_deref()
    }

    /// This table's column referenced in the `ON` condition.
    pub fn child_field(&self) -> Option<&str> {
        self.child_field.as_deref()
    }

    /// Operator placed between parent and child columns in the `ON` condition.
    pub fn compare_operator(&self) -> &str {
        &self.compare_operator
    }

    /// How this node is joined to its parent.
    pub const fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// The column separator configured on this node, if any. Nodes without one
    /// inherit their parent's.
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Child nodes in insertion order, with their join names.
    pub fn children(&self) -> impl Iterator<Item = (&str, &JoinSpec)> {
        self.children.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Looks up a direct child by join name.
    pub fn child(&self, name: &str) -> Option<&JoinSpec> {
        self.children
            .iter()
            .find(|(child_name, _)| child_name == name)
            .map(|(_, spec)| spec)
    }

    /// The fields the clause builder selects for this node: own fields, then
    /// any id field not already among them.
    pub fn selected_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.own_fields.iter().map(String::as_str).collect();
        for id in &self.id_fields {
            if !fields.contains(&id.as_str()) {
                fields.push(id);
            }
        }
        fields
    }

    /// Every `(alias, field)` pair of this node and its descendants,
    /// depth-first, parents before children.
    pub fn all_own_fields_recursive(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_own_fields(&mut out);
        out
    }

    /// Every alias used in this node's subtree, depth-first.
    pub fn aliases(&self) -> Vec<&str> {
        let mut out = vec![self.alias()];
        for (_, child) in &self.children {
            out.extend(child.aliases());
        }
        out
    }

    fn collect_own_fields<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        let alias = self.alias();
        out.extend(self.own_fields.iter().map(|f| (alias, f.as_str())));
        for (_, child) in &self.children {
            child.collect_own_fields(out);
        }
    }

    /// Attaches `spec` below this node under `name`.
    ///
    /// Only used while assembling a tree.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `name` is empty or already taken, if
    /// `spec` lacks the parent/child fields needed for its `ON` condition, or
    /// if an alias in `spec`'s subtree is already used below this node.
    /// Aliases qualify every generated column, so they must be unique across
    /// the whole tree.
    pub fn add_child(&mut self, name: impl Into<String>, spec: JoinSpec) -> RelmapResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(RelmapError::ConfigurationError(format!(
                "Join name for child of '{}' must not be empty",
                self.table_name
            )));
        }
        if self.child(&name).is_some() {
            return Err(RelmapError::ConfigurationError(format!(
                "Duplicate join name '{name}' on table '{}'",
                self.table_name
            )));
        }
        if spec.parent_field.is_none() || spec.child_field.is_none() {
            return Err(RelmapError::ConfigurationError(format!(
                "Join '{name}' ({}) needs both a parent field and a child field",
                spec.table_name
            )));
        }
        let taken = self.aliases();
        if let Some(alias) = spec.aliases().into_iter().find(|a| taken.contains(a)) {
            return Err(RelmapError::ConfigurationError(format!(
                "Join '{name}' reuses alias '{alias}' already present under table '{}'; \
                 give one of the tables a distinct alias",
                self.table_name
            )));
        }
        tracing::trace!(parent = %self.table_name, join = %name, table = %spec.table_name, "attached join");
        self.children.push((name, spec));
        Ok(())
    }
}

/// Builder for [`JoinSpec`].
#[derive(Debug, Clone)]
pub struct JoinSpecBuilder {
    table_name: String,
    table_alias: Option<String>,
    own_fields: Vec<String>,
    id_fields: Vec<String>,
    parent_field: Option<String>,
    child_field: Option<String>,
    compare_operator: String,
    join_type: JoinType,
    separator: Option<String>,
    children: Vec<(String, JoinSpec)>,
}

impl JoinSpecBuilder {
    /// Creates a builder with default attributes.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table_name: table.into(),
            table_alias: None,
            own_fields: Vec::new(),
            id_fields: vec![DEFAULT_ID_FIELD.to_string()],
            parent_field: None,
            child_field: None,
            compare_operator: "=".to_string(),
            join_type: JoinType::default(),
            separator: None,
            children: Vec::new(),
        }
    }

    /// Creates a builder whose own fields and id fields come from the table
    /// metadata provider. Tables without a reported primary key keep `"id"`.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn from_metadata(
        provider: &dyn TableMetadata,
        table: impl Into<String>,
    ) -> RelmapResult<Self> {
        let table = table.into();
        let fields = provider.field_names(&table).await?;
        let keys = provider.primary_key_names(&table).await?;
        let mut builder = Self::new(table).own_fields(fields);
        if !keys.is_empty() {
            builder = builder.id_fields(keys);
        }
        Ok(builder)
    }

    /// Sets the table alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    /// Sets the fields copied into the hydrated record.
    #[must_use]
    pub fn own_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.own_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the identity fields.
    #[must_use]
    pub fn id_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the parent's column in the `ON` condition.
    #[must_use]
    pub fn parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = Some(field.into());
        self
    }

    /// Sets this table's column in the `ON` condition.
    #[must_use]
    pub fn child_field(mut self, field: impl Into<String>) -> Self {
        self.child_field = Some(field.into());
        self
    }

    /// Sets the `ON` comparison operator (default `=`).
    #[must_use]
    pub fn compare_operator(mut self, op: impl Into<String>) -> Self {
        self.compare_operator = op.into();
        self
    }

    /// Sets the join type (default `LEFT JOIN`).
    #[must_use]
    pub const fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// Overrides the column separator for this node and its descendants.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Queues a child join. Name collisions are reported by [`build`](Self::build).
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, spec: JoinSpec) -> Self {
        self.children.push((name.into(), spec));
        self
    }

    /// Validates and builds the node.
    ///
    /// Duplicate own or id fields are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the table name is empty, the id field
    /// list is empty, the separator is empty, or a child is rejected by
    /// [`JoinSpec::add_child`].
    pub fn build(self) -> RelmapResult<JoinSpec> {
        if self.table_name.trim().is_empty() {
            return Err(RelmapError::ConfigurationError(
                "Join specification needs a table name".to_string(),
            ));
        }
        let id_fields = dedup(self.id_fields);
        if id_fields.is_empty() {
            return Err(RelmapError::ConfigurationError(format!(
                "Table '{}' needs at least one id field",
                self.table_name
            )));
        }
        if self.separator.as_deref() == Some("") {
            return Err(RelmapError::ConfigurationError(format!(
                "Column separator for table '{}' must not be empty",
                self.table_name
            )));
        }

        let mut spec = JoinSpec {
            table_name: self.table_name,
            table_alias: self.table_alias.filter(|a| !a.is_empty()),
            own_fields: dedup(self.own_fields),
            id_fields,
            parent_field: self.parent_field,
            child_field: self.child_field,
            compare_operator: self.compare_operator,
            join_type: self.join_type,
            separator: self.separator,
            children: Vec::with_capacity(self.children.len()),
        };
        for (name, child) in self.children {
            spec.add_child(name, child)?;
        }
        Ok(spec)
    }
}

fn dedup(fields: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        if !out.contains(&field) {
            out.push(field);
        }
    }
    out
}
