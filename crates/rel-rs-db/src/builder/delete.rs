//! DELETE compilation.

use rel_rs_core::RelResult;

use super::buffer::BufferFactory;
use super::filter::FilterBuilder;
use super::query::QueryBuilder;
use crate::query::filter::FilterQuery;
use crate::value::Value;

/// DELETE compiler.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    buffer_factory: BufferFactory,
    query: QueryBuilder,
    filter: FilterBuilder,
}

impl DeleteBuilder {
    /// Creates a builder; `query` renders sub-queries inside the filter.
    pub const fn new(buffer_factory: BufferFactory, query: QueryBuilder) -> Self {
        Self {
            buffer_factory,
            query,
            filter: FilterBuilder,
        }
    }

    /// Compiles `DELETE FROM table [WHERE filter];`.
    ///
    /// # Errors
    ///
    /// Returns [`rel_rs_core::RelError::InvalidQuery`] for a filter that
    /// cannot be compiled.
    pub fn build(&self, table: &str, filter: &FilterQuery) -> RelResult<(String, Vec<Value>)> {
        let mut buffer = self.buffer_factory.create();
        buffer.write_str("DELETE FROM ");
        buffer.write_escape(table);

        if !filter.is_none() {
            buffer.write_str(" WHERE ");
            self.filter.write(&mut buffer, filter, &self.query)?;
        }

        buffer.write_char(';');
        Ok(buffer.into_parts())
    }
}
