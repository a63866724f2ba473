//! Index definitions.

use super::SchemaOp;
use crate::query::filter::FilterQuery;

/// A CREATE INDEX or DROP INDEX change.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Indexed table.
    pub table: String,
    /// Index name.
    pub name: String,
    /// `UNIQUE`
    pub unique: bool,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Create or drop.
    pub op: SchemaOp,
    /// `IF NOT EXISTS` on create, `IF EXISTS` on drop.
    pub optional: bool,
    /// Partial index condition, rendered with inline literals.
    pub filter: FilterQuery,
    /// Raw trailing options.
    pub options: String,
}

impl Index {
    /// An index to be created.
    pub fn new<S: Into<String>>(
        table: impl Into<String>,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            unique: false,
            columns: columns.into_iter().map(Into::into).collect(),
            op: SchemaOp::Create,
            optional: false,
            filter: FilterQuery::None,
            options: String::new(),
        }
    }

    /// An index to be dropped.
    pub fn drop(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            op: SchemaOp::Drop,
            ..Self::new(table, name, Vec::<String>::new())
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds `IF NOT EXISTS` / `IF EXISTS`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Restricts the index to rows matching `filter`.
    #[must_use]
    pub fn filter(mut self, filter: FilterQuery) -> Self {
        self.filter = filter;
        self
    }

    /// Sets raw trailing options.
    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }
}
