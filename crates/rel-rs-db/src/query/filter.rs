//! Filter trees for WHERE, HAVING and JOIN conditions.
//!
//! A [`FilterQuery`] is a tagged tree: logical nodes hold children, leaf nodes
//! hold a field and a [`FilterValue`]. Leaves are usually built with the free
//! constructor functions in this module and combined with `&`, `|` and `!`.
//!
//! # Examples
//!
//! ```
//! use rel_rs_db::query::filter::{eq, like, FilterQuery};
//!
//! let f = like("title", "%Sleep%") & eq("completed", false);
//! match &f {
//!     FilterQuery::And(inner) => assert_eq!(inner.len(), 2),
//!     _ => panic!("expected AND"),
//! }
//! ```

use std::ops;

use super::Query;
use crate::value::Value;

/// Comparison operators for [`FilterQuery::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl CompareOp {
    /// Returns the SQL operator token.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// A sub-query wrapped with an operator prefix such as `ANY` or `EXISTS`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    /// Text written immediately before the opening parenthesis.
    pub prefix: String,
    /// The wrapped query.
    pub query: Box<Query>,
}

impl SubQuery {
    /// Wraps a query with an arbitrary prefix.
    pub fn new(prefix: impl Into<String>, query: Query) -> Self {
        Self {
            prefix: prefix.into(),
            query: Box::new(query),
        }
    }

    /// `ANY(<query>)`
    pub fn any(query: Query) -> Self {
        Self::new("ANY", query)
    }

    /// `ALL(<query>)`
    pub fn all(query: Query) -> Self {
        Self::new("ALL", query)
    }

    /// `EXISTS(<query>)`
    pub fn exists(query: Query) -> Self {
        Self::new("EXISTS", query)
    }
}

/// The right-hand side of a filter leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A scalar bound as an argument.
    Value(Value),
    /// A nested query rendered in parentheses.
    Query(Box<Query>),
    /// A nested query rendered with an operator prefix.
    SubQuery(SubQuery),
    /// Wildcard used by mock expectations: matches any input value.
    ///
    /// The statement builders reject it with `RelError::InvalidQuery`.
    Any,
}

impl FilterValue {
    /// Returns `true` for [`FilterValue::Any`].
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Query> for FilterValue {
    fn from(q: Query) -> Self {
        Self::Query(Box::new(q))
    }
}

impl From<SubQuery> for FilterValue {
    fn from(s: SubQuery) -> Self {
        Self::SubQuery(s)
    }
}

macro_rules! filter_value_from_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FilterValue {
                fn from(v: $t) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

filter_value_from_scalar!(
    bool,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &str,
    Vec<u8>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::NaiveTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    uuid::Uuid,
    serde_json::Value,
);

/// A node of a filter tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterQuery {
    /// No condition. Renders nothing and suppresses the surrounding keyword.
    #[default]
    None,
    /// Conjunction of the children.
    And(Vec<FilterQuery>),
    /// Disjunction of the children.
    Or(Vec<FilterQuery>),
    /// Negation of the conjunction of the children.
    Not(Vec<FilterQuery>),
    /// `field <op> value`
    Compare {
        /// Comparison operator.
        op: CompareOp,
        /// Left-hand field.
        field: String,
        /// Right-hand value or sub-query.
        value: FilterValue,
    },
    /// `field IS NULL`
    Nil(String),
    /// `field IS NOT NULL`
    NotNil(String),
    /// `field LIKE pattern`. The pattern is bound as given.
    Like {
        /// Matched field.
        field: String,
        /// Pattern including any `%`/`_` wildcards.
        pattern: FilterValue,
    },
    /// `field NOT LIKE pattern`
    NotLike {
        /// Matched field.
        field: String,
        /// Pattern including any `%`/`_` wildcards.
        pattern: FilterValue,
    },
    /// `field IN (values)`
    In {
        /// Tested field.
        field: String,
        /// Candidate values, or a single sub-query.
        values: Vec<FilterValue>,
    },
    /// `field NOT IN (values)`
    Nin {
        /// Tested field.
        field: String,
        /// Candidate values, or a single sub-query.
        values: Vec<FilterValue>,
    },
    /// Raw SQL carrying its own placeholders.
    Fragment {
        /// SQL text emitted verbatim.
        expr: String,
        /// Arguments for the placeholders inside `expr`.
        args: Vec<Value>,
    },
}

impl FilterQuery {
    /// Returns `true` when this filter renders no condition at all.
    ///
    /// A logical group counts as none when every child does, so it never
    /// produces a dangling `WHERE` or a bare `NOT`.
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::And(inner) | Self::Or(inner) | Self::Not(inner) => {
                inner.iter().all(Self::is_none)
            }
            _ => false,
        }
    }

    /// Returns `true` if any leaf compares against [`FilterValue::Any`].
    pub fn has_wildcard(&self) -> bool {
        match self {
            Self::And(inner) | Self::Or(inner) | Self::Not(inner) => {
                inner.iter().any(Self::has_wildcard)
            }
            Self::Compare { value, .. } => value.is_wildcard(),
            Self::Like { pattern, .. } | Self::NotLike { pattern, .. } => pattern.is_wildcard(),
            Self::In { values, .. } | Self::Nin { values, .. } => {
                values.iter().any(FilterValue::is_wildcard)
            }
            Self::None | Self::Nil(_) | Self::NotNil(_) | Self::Fragment { .. } => false,
        }
    }

    /// Conjoins `other`, flattening nested ANDs and dropping empty sides.
    #[must_use]
    pub fn and_with(self, other: Self) -> Self {
        match (self, other) {
            (lhs, rhs) if rhs.is_none() => lhs,
            (lhs, rhs) if lhs.is_none() => rhs,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjoins `other`, flattening nested ORs and dropping empty sides.
    #[must_use]
    pub fn or_with(self, other: Self) -> Self {
        match (self, other) {
            (lhs, rhs) if rhs.is_none() => lhs,
            (lhs, rhs) if lhs.is_none() => rhs,
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::BitAnd for FilterQuery {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and_with(rhs)
    }
}

impl ops::BitOr for FilterQuery {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or_with(rhs)
    }
}

impl ops::Not for FilterQuery {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            // Double negation cancellation
            Self::Not(mut inner) if inner.len() == 1 => inner.remove(0),
            Self::Not(inner) => and(inner),
            other if other.is_none() => other,
            other => Self::Not(vec![other]),
        }
    }
}

// ── Constructors ─────────────────────────────────────────────────────

fn compare(op: CompareOp, field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    FilterQuery::Compare {
        op,
        field: field.into(),
        value: value.into(),
    }
}

/// `field = value`
pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Eq, field, value)
}

/// `field <> value`
pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Ne, field, value)
}

/// `field < value`
pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Lt, field, value)
}

/// `field <= value`
pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Lte, field, value)
}

/// `field > value`
pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Gt, field, value)
}

/// `field >= value`
pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> FilterQuery {
    compare(CompareOp::Gte, field, value)
}

/// `field IS NULL`
pub fn nil(field: impl Into<String>) -> FilterQuery {
    FilterQuery::Nil(field.into())
}

/// `field IS NOT NULL`
pub fn not_nil(field: impl Into<String>) -> FilterQuery {
    FilterQuery::NotNil(field.into())
}

/// `field IN (values...)`
pub fn in_<V: Into<FilterValue>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> FilterQuery {
    FilterQuery::In {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// `field NOT IN (values...)`
pub fn nin<V: Into<FilterValue>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> FilterQuery {
    FilterQuery::Nin {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// `field IN (<query>)`
pub fn in_query(field: impl Into<String>, query: Query) -> FilterQuery {
    FilterQuery::In {
        field: field.into(),
        values: vec![FilterValue::from(query)],
    }
}

/// `field LIKE pattern`
pub fn like(field: impl Into<String>, pattern: impl Into<FilterValue>) -> FilterQuery {
    FilterQuery::Like {
        field: field.into(),
        pattern: pattern.into(),
    }
}

/// `field NOT LIKE pattern`
pub fn not_like(field: impl Into<String>, pattern: impl Into<FilterValue>) -> FilterQuery {
    FilterQuery::NotLike {
        field: field.into(),
        pattern: pattern.into(),
    }
}

/// Raw SQL with its own placeholders.
pub fn fragment(expr: impl Into<String>, args: Vec<Value>) -> FilterQuery {
    FilterQuery::Fragment {
        expr: expr.into(),
        args,
    }
}

fn without_none(inner: Vec<FilterQuery>) -> Vec<FilterQuery> {
    inner.into_iter().filter(|f| !f.is_none()).collect()
}

/// Conjunction. Empty children are dropped and a single survivor is
/// returned unwrapped.
pub fn and(inner: Vec<FilterQuery>) -> FilterQuery {
    let mut inner = without_none(inner);
    match inner.len() {
        0 => FilterQuery::None,
        1 => inner.remove(0),
        _ => FilterQuery::And(inner),
    }
}

/// Disjunction. Empty children are dropped and a single survivor is
/// returned unwrapped.
pub fn or(inner: Vec<FilterQuery>) -> FilterQuery {
    let mut inner = without_none(inner);
    match inner.len() {
        0 => FilterQuery::None,
        1 => inner.remove(0),
        _ => FilterQuery::Or(inner),
    }
}

/// Negation of the conjunction of `inner`. Negating nothing is nothing.
pub fn not(inner: Vec<FilterQuery>) -> FilterQuery {
    let inner = without_none(inner);
    if inner.is_empty() {
        return FilterQuery::None;
    }
    FilterQuery::Not(inner)
}

/// `EXISTS(<query>)` as a comparison value.
pub fn exists(query: Query) -> SubQuery {
    SubQuery::exists(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_builds_compare() {
        let f = eq("title", "Sleep");
        assert_eq!(
            f,
            FilterQuery::Compare {
                op: CompareOp::Eq,
                field: "title".into(),
                value: FilterValue::Value(Value::from("Sleep")),
            }
        );
    }

    #[test]
    fn test_is_none() {
        assert!(FilterQuery::None.is_none());
        assert!(FilterQuery::And(vec![]).is_none());
        assert!(FilterQuery::Not(vec![]).is_none());
        assert!(!nil("deleted_at").is_none());
        assert!(FilterQuery::default().is_none());
    }

    #[test]
    fn test_and_flattens() {
        let f = eq("a", 1) & eq("b", 2) & eq("c", 3);
        match f {
            FilterQuery::And(inner) => assert_eq!(inner.len(), 3),
            other => panic!("Expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_and_with_none_is_identity() {
        let f = FilterQuery::None.and_with(eq("a", 1));
        assert_eq!(f, eq("a", 1));
        let f = eq("a", 1).and_with(FilterQuery::None);
        assert_eq!(f, eq("a", 1));
    }

    #[test]
    fn test_or_flattens_and_prepends() {
        let f = eq("a", 1) | (eq("b", 2) | eq("c", 3));
        match f {
            FilterQuery::Or(inner) => {
                assert_eq!(inner.len(), 3);
                assert_eq!(inner[0], eq("a", 1));
            }
            other => panic!("Expected Or, got {other:?}"),
        }
    }

    #[test]
    fn test_double_negation() {
        let f = !!eq("a", 1);
        assert_eq!(f, eq("a", 1));
        assert_eq!(!FilterQuery::None, FilterQuery::None);
    }

    #[test]
    fn test_and_or_single_child_unwrapped() {
        assert_eq!(and(vec![nil("x")]), nil("x"));
        assert_eq!(or(vec![nil("x")]), nil("x"));
        assert!(matches!(and(vec![nil("x"), nil("y")]), FilterQuery::And(_)));
    }

    #[test]
    fn test_constructors_drop_empty_children() {
        assert_eq!(and(vec![eq("a", 1), FilterQuery::None]), eq("a", 1));
        assert_eq!(or(vec![FilterQuery::And(vec![]), nil("x")]), nil("x"));
        assert_eq!(and(vec![FilterQuery::None, FilterQuery::None]), FilterQuery::None);
        assert_eq!(not(vec![FilterQuery::None]), FilterQuery::None);
        assert_eq!(
            or(vec![eq("a", 1), FilterQuery::None, eq("b", 2)]),
            FilterQuery::Or(vec![eq("a", 1), eq("b", 2)])
        );
    }

    #[test]
    fn test_is_none_looks_through_nested_groups() {
        assert!(FilterQuery::And(vec![FilterQuery::None]).is_none());
        assert!(FilterQuery::Not(vec![FilterQuery::Or(vec![])]).is_none());
        assert!(!FilterQuery::Or(vec![FilterQuery::None, nil("x")]).is_none());
    }

    #[test]
    fn test_has_wildcard() {
        assert!(!(eq("a", 1) & like("b", "x%")).has_wildcard());
        assert!((eq("a", 1) | !eq("b", FilterValue::Any)).has_wildcard());
        assert!(in_("id", [FilterValue::Any]).has_wildcard());
        assert!(not_like("t", FilterValue::Any).has_wildcard());
    }

    #[test]
    fn test_in_collects_values() {
        let f = in_("id", [1, 2, 3]);
        match f {
            FilterQuery::In { field, values } => {
                assert_eq!(field, "id");
                assert_eq!(values.len(), 3);
                assert_eq!(values[2], FilterValue::Value(Value::Int(3)));
            }
            other => panic!("Expected In, got {other:?}"),
        }
    }

    #[test]
    fn test_in_query_single_subquery() {
        let f = in_query("score_id", Query::from("scores"));
        match f {
            FilterQuery::In { values, .. } => {
                assert!(matches!(values[0], FilterValue::Query(_)));
            }
            other => panic!("Expected In, got {other:?}"),
        }
    }

    #[test]
    fn test_subquery_prefixes() {
        assert_eq!(SubQuery::any(Query::from("t")).prefix, "ANY");
        assert_eq!(SubQuery::all(Query::from("t")).prefix, "ALL");
        assert_eq!(exists(Query::from("t")).prefix, "EXISTS");
    }

    #[test]
    fn test_compare_op_tokens() {
        assert_eq!(CompareOp::Ne.as_sql(), "<>");
        assert_eq!(CompareOp::Lte.as_sql(), "<=");
        assert_eq!(CompareOp::Gte.as_sql(), ">=");
    }
}
