//! Core error types for rel-rs.
//!
//! [`RelError`] covers everything an adapter can report back to a caller:
//! driver passthrough errors, connection failures, classified constraint
//! violations, transaction misuse, and rejected compiler input.
//!
//! Compiler misuse that would silently touch a whole table (an unfiltered
//! update or delete without an explicit opt-in) is not represented here. It
//! panics at the call site instead.

use std::fmt;

use thiserror::Error;

/// The kind of integrity constraint reported by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// A UNIQUE constraint or unique index.
    Unique,
    /// A FOREIGN KEY constraint.
    ForeignKey,
    /// A CHECK constraint.
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "unique"),
            Self::ForeignKey => write!(f, "foreign key"),
            Self::Check => write!(f, "check"),
        }
    }
}

/// A constraint violation extracted from a native driver error.
///
/// # Examples
///
/// ```
/// use rel_rs_core::error::{ConstraintError, ConstraintKind};
///
/// let err = ConstraintError::new("todos_title_key", ConstraintKind::Unique, "duplicate");
/// assert_eq!(err.to_string(), "unique constraint violation on 'todos_title_key': duplicate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintError {
    /// The constraint name (or column list, depending on the dialect). May be empty.
    pub key: String,
    /// The constraint kind.
    pub kind: ConstraintKind,
    /// The original driver message.
    pub message: String,
}

impl ConstraintError {
    /// Creates a new constraint error.
    pub fn new(key: impl Into<String>, kind: ConstraintKind, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constraint violation on '{}': {}",
            self.kind, self.key, self.message
        )
    }
}

impl std::error::Error for ConstraintError {}

/// The primary error type for rel-rs.
#[derive(Error, Debug)]
pub enum RelError {
    // ── Driver errors ────────────────────────────────────────────────

    /// A database error passed through from the driver unchanged.
    #[error("Database error: {0}")]
    Database(String),

    /// A connection or transport failure.
    #[error("Operational error: {0}")]
    Operational(String),

    /// A classified integrity constraint violation.
    #[error("Constraint error: {0}")]
    Constraint(ConstraintError),

    // ── Adapter errors ───────────────────────────────────────────────

    /// A query expected a row but found none.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Commit or rollback was requested outside a transaction.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The compiler rejected its input.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelError {
    /// Returns the constraint details if this is a classified constraint violation.
    pub const fn constraint(&self) -> Option<&ConstraintError> {
        match self {
            Self::Constraint(c) => Some(c),
            _ => None,
        }
    }

    /// Checks if this is a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        self.constraint()
            .is_some_and(|c| c.kind == ConstraintKind::Unique)
    }

    /// Checks if this is a foreign key constraint violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.constraint()
            .is_some_and(|c| c.kind == ConstraintKind::ForeignKey)
    }

    /// Checks if this is a check constraint violation.
    pub fn is_check_violation(&self) -> bool {
        self.constraint()
            .is_some_and(|c| c.kind == ConstraintKind::Check)
    }

    /// Checks if this is a not found error.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ConstraintError> for RelError {
    fn from(err: ConstraintError) -> Self {
        Self::Constraint(err)
    }
}

/// A convenience type alias for `Result<T, RelError>`.
pub type RelResult<T> = Result<T, RelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_error_display() {
        let err = ConstraintError::new("fk_points_score", ConstraintKind::ForeignKey, "boom");
        assert_eq!(
            err.to_string(),
            "foreign key constraint violation on 'fk_points_score': boom"
        );
    }

    #[test]
    fn test_rel_error_display() {
        let err = RelError::NotFound("todo".into());
        assert_eq!(err.to_string(), "Not found: todo");
        let err = RelError::Transaction("unable to commit outside transaction".into());
        assert_eq!(
            err.to_string(),
            "Transaction error: unable to commit outside transaction"
        );
    }

    #[test]
    fn test_constraint_predicates() {
        let unique: RelError = ConstraintError::new("k", ConstraintKind::Unique, "m").into();
        assert!(unique.is_unique_violation());
        assert!(!unique.is_foreign_key_violation());
        assert!(!unique.is_check_violation());

        let check: RelError = ConstraintError::new("k", ConstraintKind::Check, "m").into();
        assert!(check.is_check_violation());
        assert_eq!(check.constraint().map(|c| c.key.as_str()), Some("k"));

        assert!(RelError::Database("x".into()).constraint().is_none());
    }

    #[test]
    fn test_is_not_found() {
        assert!(RelError::NotFound("x".into()).is_not_found());
        assert!(!RelError::Database("x".into()).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let rel_err: RelError = io_err.into();
        assert!(rel_err.to_string().contains("file missing"));
    }
}
