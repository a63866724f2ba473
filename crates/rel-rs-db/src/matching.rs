//! Structural matching between mock expectations and actual inputs.
//!
//! Test doubles record an expected [`Query`] (or filter, join, mutation) and
//! check each incoming call against it with [`Matches`]. Matching is equality
//! with a few wildcards: an empty expected table accepts any table,
//! [`FilterValue::Any`] accepts any value, and an expected join with an
//! association name accepts any join through the same association.
//!
//! # Examples
//!
//! ```
//! use rel_rs_db::matching::Matches;
//! use rel_rs_db::query::filter::{eq, FilterValue};
//! use rel_rs_db::query::Query;
//!
//! let expected = Query::from("todos").filter(eq("id", FilterValue::Any));
//! assert!(expected.matches(&Query::from("todos").filter(eq("id", 42))));
//! assert!(!expected.matches(&Query::from("todos").filter(eq("title", 42))));
//! ```

use crate::mutate::{Mutate, Mutates};
use crate::query::filter::{FilterQuery, FilterValue};
use crate::query::{GroupQuery, JoinQuery, Query, SelectQuery, SortQuery, SqlQuery};

/// Compares an expectation (`self`) with an actual input.
pub trait Matches<Rhs: ?Sized = Self> {
    /// Returns `true` if `input` satisfies this expectation.
    fn matches(&self, input: &Rhs) -> bool;
}

fn all_match<T: Matches>(expected: &[T], input: &[T]) -> bool {
    expected.len() == input.len() && expected.iter().zip(input).all(|(e, i)| e.matches(i))
}

impl Matches for Query {
    fn matches(&self, input: &Self) -> bool {
        (self.table.is_empty() || input.table.is_empty() || self.table == input.table)
            && self.select.matches(&input.select)
            && all_match(&self.joins, &input.joins)
            && self.filter.matches(&input.filter)
            && self.group.matches(&input.group)
            && all_match(&self.sorts, &input.sorts)
            && self.offset == input.offset
            && self.limit == input.limit
            && self.lock == input.lock
            && match (&self.sql, &input.sql) {
                (Some(e), Some(i)) => e.matches(i),
                (None, None) => true,
                _ => false,
            }
            && self.unscoped == input.unscoped
            && self.reload == input.reload
            && self.cascade == input.cascade
    }
}

impl Matches for SelectQuery {
    fn matches(&self, input: &Self) -> bool {
        self == input
    }
}

impl Matches for JoinQuery {
    fn matches(&self, input: &Self) -> bool {
        if !self.assoc.is_empty() && self.assoc == input.assoc {
            return true;
        }

        self.mode == input.mode
            && self.table == input.table
            && self.from == input.from
            && self.to == input.to
            && self.arguments == input.arguments
            && self.filter.matches(&input.filter)
    }
}

impl Matches for SortQuery {
    fn matches(&self, input: &Self) -> bool {
        self == input
    }
}

impl Matches for GroupQuery {
    fn matches(&self, input: &Self) -> bool {
        self.fields == input.fields && self.filter.matches(&input.filter)
    }
}

impl Matches for SqlQuery {
    fn matches(&self, input: &Self) -> bool {
        self == input
    }
}

impl Matches for FilterQuery {
    fn matches(&self, input: &Self) -> bool {
        if self.is_none() || input.is_none() {
            return self.is_none() && input.is_none();
        }

        match (self, input) {
            (Self::And(e), Self::And(i)) | (Self::Or(e), Self::Or(i)) | (Self::Not(e), Self::Not(i)) => {
                all_match(e, i)
            }
            (
                Self::Compare { op, field, value },
                Self::Compare {
                    op: in_op,
                    field: in_field,
                    value: in_value,
                },
            ) => op == in_op && field == in_field && value.matches(in_value),
            (Self::Nil(e), Self::Nil(i)) | (Self::NotNil(e), Self::NotNil(i)) => e == i,
            (
                Self::Like { field, pattern },
                Self::Like {
                    field: in_field,
                    pattern: in_pattern,
                },
            )
            | (
                Self::NotLike { field, pattern },
                Self::NotLike {
                    field: in_field,
                    pattern: in_pattern,
                },
            ) => field == in_field && pattern.matches(in_pattern),
            (
                Self::In { field, values },
                Self::In {
                    field: in_field,
                    values: in_values,
                },
            )
            | (
                Self::Nin { field, values },
                Self::Nin {
                    field: in_field,
                    values: in_values,
                },
            ) => field == in_field && all_match(values, in_values),
            (
                Self::Fragment { expr, args },
                Self::Fragment {
                    expr: in_expr,
                    args: in_args,
                },
            ) => expr == in_expr && args == in_args,
            _ => false,
        }
    }
}

impl Matches for FilterValue {
    fn matches(&self, input: &Self) -> bool {
        match (self, input) {
            (Self::Any, _) => true,
            (Self::Value(e), Self::Value(i)) => e == i,
            (Self::Query(e), Self::Query(i)) => e.matches(i),
            (Self::SubQuery(e), Self::SubQuery(i)) => {
                e.prefix == i.prefix && e.query.matches(&i.query)
            }
            _ => false,
        }
    }
}

impl Matches for Mutate {
    fn matches(&self, input: &Self) -> bool {
        self == input
    }
}

impl Matches for Mutates {
    fn matches(&self, input: &Self) -> bool {
        self.len() == input.len()
            && self
                .iter()
                .all(|(field, m)| input.get(field).is_some_and(|i| m.matches(i)))
    }
}
