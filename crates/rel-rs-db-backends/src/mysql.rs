//! MySQL dialect.
//!
//! `?` placeholders, backtick identifiers, `ON DUPLICATE KEY UPDATE`, and
//! generated ids reported through `last_insert_id`. Bulk inserts backfill ids
//! from the server's `auto_increment_increment`.

use std::sync::Arc;

use rel_rs_core::{ConstraintError, ConstraintKind, RelError};
use rel_rs_db::builder::{self, extract_string, OnConflictBuilder, Placeholder, Quote};
use rel_rs_db::{Column, ColumnType, DatabaseBackendType};

use crate::base::{Dialect, DialectOptions, Increment};

/// Reads the server's auto-increment step. The step is in the `Value` column.
pub const INCREMENT_QUERY: &str = "SHOW VARIABLES LIKE 'auto_increment_increment';";

/// The MySQL dialect.
pub fn dialect() -> Dialect {
    Dialect::new(
        DatabaseBackendType::MySQL,
        DialectOptions {
            quoter: Arc::new(Quote::MYSQL),
            placeholder: Placeholder::Question,
            bool_literals: ("true", "false"),
            value_converter: None,
            returning: false,
            default_values: false,
            on_conflict: OnConflictBuilder::DUPLICATE_KEY,
            column_mapper,
            drop_index_on_table: true,
            partial_index: false,
            increment: Increment::Query(INCREMENT_QUERY),
            error_mapper,
        },
    )
}

/// MySQL column types. Only JSON differs from the shared mapping.
pub fn column_mapper(column: &mut Column) -> (String, u32, u32) {
    match column.kind {
        ColumnType::Json => ("JSON".into(), 0, 0),
        _ => builder::column_mapper(column),
    }
}

/// Classifies duplicate-entry, foreign-key and check errors.
pub fn error_mapper(err: RelError) -> RelError {
    let RelError::Database(message) = err else {
        return err;
    };

    let (kind, key) = if message.contains("Duplicate entry") {
        (
            ConstraintKind::Unique,
            extract_string(&message, "key '", "'").to_string(),
        )
    } else if message.contains("a foreign key constraint fails") {
        (ConstraintKind::ForeignKey, foreign_key_name(&message))
    } else if message.contains("Check constraint '") {
        (
            ConstraintKind::Check,
            extract_string(&message, "Check constraint '", "'").to_string(),
        )
    } else {
        return RelError::Database(message);
    };

    RelError::Constraint(ConstraintError::new(key, kind, message))
}

/// The name after ``CONSTRAINT ` ``. The message quotes several identifiers
/// in backticks, so this stops at the first closing one.
fn foreign_key_name(message: &str) -> String {
    const MARKER: &str = "CONSTRAINT `";
    message.find(MARKER).map_or_else(
        || message.to_string(),
        |start| {
            let rest = &message[start + MARKER.len()..];
            rest.split('`').next().unwrap_or(rest).to_string()
        },
    )
}
