//! Row mutations and conflict handling for INSERT/UPDATE.

use std::collections::BTreeMap;

use crate::value::Value;

/// A single-field mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutate {
    /// `field = value`
    Set(Value),
    /// `field = field + delta`
    Inc(Value),
    /// The map key is emitted as raw SQL; these are its arguments.
    Fragment(Vec<Value>),
}

impl Mutate {
    /// Assigns `value`.
    pub fn set(value: impl Into<Value>) -> Self {
        Self::Set(value.into())
    }

    /// Increments by `n`.
    pub fn inc(n: i64) -> Self {
        Self::Inc(Value::Int(n))
    }

    /// Decrements by `n`.
    pub fn dec(n: i64) -> Self {
        Self::Inc(Value::Int(-n))
    }

    /// Raw SQL; the field key is the expression.
    pub const fn fragment(args: Vec<Value>) -> Self {
        Self::Fragment(args)
    }

    /// Returns the assigned value when this is a [`Mutate::Set`].
    pub const fn set_value(&self) -> Option<&Value> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }
}

/// One row's changes keyed by field name, iterated in field order.
pub type Mutates = BTreeMap<String, Mutate>;

/// Builds a [`Mutates`] map of plain assignments.
///
/// # Examples
///
/// ```
/// use rel_rs_db::mutate::{set_all, Mutate};
/// use rel_rs_db::value::Value;
///
/// let m = set_all([("title", Value::from("Sleep")), ("completed", Value::from(false))]);
/// assert_eq!(m["title"], Mutate::set("Sleep"));
/// ```
pub fn set_all<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Mutates {
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Mutate::Set(v)))
        .collect()
}

/// What to do when an INSERT hits a conflicting row.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// Keep the existing row.
    Ignore,
    /// Overwrite the existing row with the inserted values.
    Replace,
    /// Raw SQL with its own placeholders.
    Fragment {
        /// SQL text emitted after the conflict statement.
        expr: String,
        /// Arguments for the placeholders in `expr`.
        args: Vec<Value>,
    },
}

/// Conflict resolution for INSERT. Omitted from the statement when `action` is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnConflict {
    /// Conflict target columns. Only rendered by dialects that accept a key list.
    pub keys: Vec<String>,
    /// The resolution.
    pub action: Option<ConflictAction>,
}

impl OnConflict {
    /// Ignore conflicts on `keys`.
    pub fn ignore<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            action: Some(ConflictAction::Ignore),
        }
    }

    /// Replace on conflicts on `keys`.
    pub fn replace<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            action: Some(ConflictAction::Replace),
        }
    }

    /// Raw conflict action.
    pub fn fragment(expr: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            keys: Vec::new(),
            action: Some(ConflictAction::Fragment {
                expr: expr.into(),
                args,
            }),
        }
    }

    /// Returns `true` when no clause will be rendered.
    pub const fn is_none(&self) -> bool {
        self.action.is_none()
    }
}
