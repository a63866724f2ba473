//! The dialect-neutral query representation.
//!
//! A [`Query`] is a plain value: it describes a SELECT (and carries the table
//! and filter for UPDATE/DELETE) without touching a connection. It is built
//! fluently and handed to the builders in [`crate::builder`] for rendering.
//!
//! # Examples
//!
//! ```
//! use rel_rs_db::query::Query;
//! use rel_rs_db::query::filter::{eq, like};
//!
//! let query = Query::from("todos")
//!     .filter(like("title", "%Sleep%"))
//!     .filter(eq("completed", false))
//!     .sort_asc("order")
//!     .limit(10);
//!
//! assert_eq!(query.table, "todos");
//! assert_eq!(query.sorts.len(), 1);
//! ```

pub mod filter;

use crate::value::Value;
use filter::FilterQuery;

/// The SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectQuery {
    /// Whether to emit `DISTINCT`.
    pub distinct: bool,
    /// Selected fields. Empty means every column of the query table.
    pub fields: Vec<String>,
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinQuery {
    /// The join keyword(s), e.g. `JOIN` or `LEFT JOIN`, or a raw join expression.
    pub mode: String,
    /// The joined table. Empty for raw join expressions.
    pub table: String,
    /// Column on the query side of the ON condition.
    pub from: String,
    /// Column on the joined side of the ON condition.
    pub to: String,
    /// Association name, resolved by higher layers.
    pub assoc: String,
    /// Extra condition AND-appended to the ON clause.
    pub filter: FilterQuery,
    /// Arguments for placeholders embedded in `mode`.
    pub arguments: Vec<Value>,
}

impl JoinQuery {
    /// A join whose ON columns are inferred from the table names.
    pub fn new(mode: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    /// A join with explicit ON columns.
    pub fn on(
        mode: impl Into<String>,
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            mode: mode.into(),
            table: table.into(),
            from: from.into(),
            to: to.into(),
            ..Self::default()
        }
    }

    /// A raw join expression with its own placeholders.
    pub fn fragment(expr: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            mode: expr.into(),
            arguments,
            ..Self::default()
        }
    }

    /// A join through a named association.
    pub fn assoc(mode: impl Into<String>, assoc: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            assoc: assoc.into(),
            ..Self::default()
        }
    }

    /// Adds an extra condition to the ON clause.
    #[must_use]
    pub fn filter(mut self, filter: FilterQuery) -> Self {
        self.filter = std::mem::take(&mut self.filter).and_with(filter);
        self
    }
}

/// A single ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortQuery {
    /// Sorted field.
    pub field: String,
    /// `true` for ascending.
    pub asc: bool,
}

impl SortQuery {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            asc: true,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            asc: false,
        }
    }
}

/// GROUP BY fields and the HAVING filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupQuery {
    /// Grouped fields.
    pub fields: Vec<String>,
    /// HAVING condition. Ignored when `fields` is empty.
    pub filter: FilterQuery,
}

/// A raw statement that replaces structured rendering entirely.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    /// The SQL text, including its own placeholders.
    pub statement: String,
    /// Arguments for the placeholders.
    pub values: Vec<Value>,
}

/// A dialect-neutral query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// The query table.
    pub table: String,
    /// The SELECT list.
    pub select: SelectQuery,
    /// JOIN clauses in order.
    pub joins: Vec<JoinQuery>,
    /// The WHERE condition.
    pub filter: FilterQuery,
    /// GROUP BY / HAVING.
    pub group: GroupQuery,
    /// ORDER BY entries in order.
    pub sorts: Vec<SortQuery>,
    /// OFFSET. Only rendered together with a positive limit.
    pub offset: u64,
    /// LIMIT. `0` means no limit.
    pub limit: u64,
    /// Locking clause, e.g. `FOR UPDATE`.
    pub lock: Option<String>,
    /// Raw statement override.
    pub sql: Option<SqlQuery>,
    /// Skip default scopes (inert to the builders).
    pub unscoped: bool,
    /// Reload records after mutation (inert to the builders).
    pub reload: bool,
    /// Cascade to associations (inert to the builders).
    pub cascade: bool,
    /// Permit update-any/delete-any without a filter.
    pub allow_unsafe: bool,
}

impl From<&str> for Query {
    fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }
}

impl From<String> for Query {
    fn from(table: String) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }
}

impl Query {
    /// Starts a query selecting `fields`.
    pub fn select<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            select: SelectQuery {
                distinct: false,
                fields: fields.into_iter().map(Into::into).collect(),
            },
            ..Self::default()
        }
    }

    /// Starts a query from a raw statement.
    pub fn sql(statement: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: Some(SqlQuery {
                statement: statement.into(),
                values,
            }),
            ..Self::default()
        }
    }

    /// Sets the query table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Emits `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.select.distinct = true;
        self
    }

    /// Inner join with ON columns inferred from the table names.
    #[must_use]
    pub fn join(self, table: impl Into<String>) -> Self {
        self.join_with(JoinQuery::new("JOIN", table))
    }

    /// Inner join with explicit ON columns.
    #[must_use]
    pub fn join_on(
        self,
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.join_with(JoinQuery::on("JOIN", table, from, to))
    }

    /// Inner join through an association.
    #[must_use]
    pub fn join_assoc(self, assoc: impl Into<String>) -> Self {
        self.join_with(JoinQuery::assoc("JOIN", assoc))
    }

    /// Appends an arbitrary join clause.
    #[must_use]
    pub fn join_with(mut self, join: JoinQuery) -> Self {
        self.joins.push(join);
        self
    }

    /// AND-accumulates a WHERE condition.
    #[must_use]
    pub fn filter(mut self, filter: FilterQuery) -> Self {
        self.filter = std::mem::take(&mut self.filter).and_with(filter);
        self
    }

    /// Sets the GROUP BY fields.
    #[must_use]
    pub fn group<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// AND-accumulates a HAVING condition.
    #[must_use]
    pub fn having(mut self, filter: FilterQuery) -> Self {
        self.group.filter = std::mem::take(&mut self.group.filter).and_with(filter);
        self
    }

    /// Appends an ascending sort.
    #[must_use]
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sorts.push(SortQuery::asc(field));
        self
    }

    /// Appends a descending sort.
    #[must_use]
    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sorts.push(SortQuery::desc(field));
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets a raw locking clause.
    #[must_use]
    pub fn lock(mut self, lock: impl Into<String>) -> Self {
        self.lock = Some(lock.into());
        self
    }

    /// Shorthand for `lock("FOR UPDATE")`.
    #[must_use]
    pub fn for_update(self) -> Self {
        self.lock("FOR UPDATE")
    }

    /// Marks the query unscoped.
    #[must_use]
    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Marks the query for reload.
    #[must_use]
    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    /// Marks the query for cascading.
    #[must_use]
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    /// Permits update-any/delete-any without a WHERE condition.
    #[must_use]
    pub fn allow_unsafe(mut self) -> Self {
        self.allow_unsafe = true;
        self
    }
}
