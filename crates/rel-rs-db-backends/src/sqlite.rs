//! SQLite dialect.
//!
//! `?` placeholders, `"` identifiers, `ON CONFLICT` with `excluded`,
//! `RETURNING`, and integer booleans.

use std::sync::Arc;

use rel_rs_core::{ConstraintError, ConstraintKind, RelError};
use rel_rs_db::builder::{self, extract_string, OnConflictBuilder, Placeholder, Quote};
use rel_rs_db::{Column, ColumnType, DatabaseBackendType};

use crate::base::{Dialect, DialectOptions, Increment};

/// The SQLite dialect.
pub fn dialect() -> Dialect {
    Dialect::new(
        DatabaseBackendType::SQLite,
        DialectOptions {
            quoter: Arc::new(Quote::ANSI),
            placeholder: Placeholder::Question,
            bool_literals: ("1", "0"),
            value_converter: None,
            returning: true,
            default_values: true,
            on_conflict: OnConflictBuilder::EXCLUDED,
            column_mapper,
            drop_index_on_table: false,
            partial_index: true,
            increment: Increment::Fixed(1),
            error_mapper,
        },
    )
}

/// SQLite column types. Ids are plain `INTEGER` (rowid aliases) and integer
/// and text lengths are dropped.
pub fn column_mapper(column: &mut Column) -> (String, u32, u32) {
    match column.kind {
        ColumnType::Id | ColumnType::BigId => ("INTEGER".into(), 0, 0),
        ColumnType::Int | ColumnType::BigInt | ColumnType::Text => {
            column.limit = 0;
            builder::column_mapper(column)
        }
        _ => builder::column_mapper(column),
    }
}

/// Classifies `<KIND> constraint failed: <target>` errors.
pub fn error_mapper(err: RelError) -> RelError {
    let RelError::Database(message) = err else {
        return err;
    };

    let kind = if message.contains("UNIQUE constraint failed") {
        ConstraintKind::Unique
    } else if message.contains("FOREIGN KEY constraint failed") {
        ConstraintKind::ForeignKey
    } else if message.contains("CHECK constraint failed") {
        ConstraintKind::Check
    } else {
        return RelError::Database(message);
    };

    // SQLite does not name the violated foreign key.
    let key = if kind == ConstraintKind::ForeignKey {
        String::new()
    } else {
        extract_string(&message, "failed: ", "").to_string()
    };

    RelError::Constraint(ConstraintError::new(key, kind, message))
}
