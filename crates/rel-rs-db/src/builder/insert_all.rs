//! Multi-row INSERT compilation.

use rel_rs_core::{RelError, RelResult};

use super::buffer::BufferFactory;
use super::on_conflict::OnConflictBuilder;
use crate::mutate::{Mutate, Mutates, OnConflict};
use crate::value::Value;

/// Bulk INSERT compiler.
#[derive(Debug, Clone)]
pub struct InsertAllBuilder {
    /// Buffer configuration.
    pub buffer_factory: BufferFactory,
    /// Append `RETURNING <primary>`.
    pub returning_primary: bool,
    /// Conflict clause wording.
    pub on_conflict: OnConflictBuilder,
}

impl InsertAllBuilder {
    /// Compiles one INSERT covering every row in `bulk`.
    ///
    /// Each row renders `fields` in order. A field a row does not set is
    /// written as `DEFAULT`.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::InvalidQuery`] when `bulk` is empty or the
    /// conflict clause cannot be expressed.
    pub fn build(
        &self,
        table: &str,
        primary_field: &str,
        fields: &[String],
        bulk: &[Mutates],
        on_conflict: &OnConflict,
    ) -> RelResult<(String, Vec<Value>)> {
        if bulk.is_empty() {
            return Err(RelError::InvalidQuery(format!(
                "bulk insert into '{table}' requires at least one row"
            )));
        }

        let mut buffer = self.buffer_factory.create();
        buffer.write_str("INSERT INTO ");
        buffer.write_escape(table);
        buffer.write_str(" (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            buffer.write_escape(field);
        }
        buffer.write_str(") VALUES ");

        for (i, mutates) in bulk.iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            buffer.write_char('(');
            for (j, field) in fields.iter().enumerate() {
                if j > 0 {
                    buffer.write_char(',');
                }
                match mutates.get(field) {
                    Some(Mutate::Set(value)) => buffer.write_value(value),
                    _ => buffer.write_str("DEFAULT"),
                }
            }
            buffer.write_char(')');
        }

        self.on_conflict.write(&mut buffer, fields, on_conflict)?;

        if self.returning_primary && !primary_field.is_empty() {
            buffer.write_str(" RETURNING ");
            buffer.write_escape(primary_field);
        }

        buffer.write_char(';');
        Ok(buffer.into_parts())
    }
}
