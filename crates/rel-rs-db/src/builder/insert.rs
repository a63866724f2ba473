//! Single-row INSERT compilation.

use rel_rs_core::RelResult;

use super::buffer::BufferFactory;
use super::on_conflict::OnConflictBuilder;
use crate::mutate::{Mutate, Mutates, OnConflict};
use crate::value::Value;

/// INSERT compiler.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    /// Buffer configuration.
    pub buffer_factory: BufferFactory,
    /// Append `RETURNING <primary>`.
    pub returning_primary: bool,
    /// Use `DEFAULT VALUES` for an empty row.
    pub insert_default_values: bool,
    /// Conflict clause wording.
    pub on_conflict: OnConflictBuilder,
}

impl InsertBuilder {
    /// Compiles an INSERT of one row. Only [`Mutate::Set`] entries are inserted.
    ///
    /// # Errors
    ///
    /// Returns [`rel_rs_core::RelError::InvalidQuery`] for a conflict clause
    /// the dialect cannot express, see [`OnConflictBuilder::write`].
    pub fn build(
        &self,
        table: &str,
        primary_field: &str,
        mutates: &Mutates,
        on_conflict: &OnConflict,
    ) -> RelResult<(String, Vec<Value>)> {
        let mut buffer = self.buffer_factory.create();
        let values: Vec<(&String, &Value)> = mutates
            .iter()
            .filter_map(|(field, m)| match m {
                Mutate::Set(v) => Some((field, v)),
                _ => None,
            })
            .collect();

        buffer.write_str("INSERT INTO ");
        buffer.write_escape(table);

        if values.is_empty() && self.insert_default_values {
            buffer.write_str(" DEFAULT VALUES");
        } else {
            buffer.write_str(" (");
            for (i, (field, _)) in values.iter().enumerate() {
                if i > 0 {
                    buffer.write_char(',');
                }
                buffer.write_escape(field);
            }
            buffer.write_str(") VALUES (");
            for (i, (_, value)) in values.iter().enumerate() {
                if i > 0 {
                    buffer.write_char(',');
                }
                buffer.write_value(value);
            }
            buffer.write_char(')');
        }

        self.on_conflict
            .write_mutates(&mut buffer, mutates, on_conflict)?;

        if self.returning_primary && !primary_field.is_empty() {
            buffer.write_str(" RETURNING ");
            buffer.write_escape(primary_field);
        }

        buffer.write_char(';');
        Ok(buffer.into_parts())
    }
}
