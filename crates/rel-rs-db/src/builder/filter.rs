//! Renders [`FilterQuery`] trees into WHERE, HAVING and ON conditions.

use rel_rs_core::{RelError, RelResult};

use super::buffer::Buffer;
use super::QueryWriter;
use crate::query::filter::{FilterQuery, FilterValue};

/// Filter compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder;

impl FilterBuilder {
    /// Writes `filter` into `buffer`. Nested queries are rendered with `query`.
    ///
    /// Children that render nothing are skipped, so a group never ends with
    /// a dangling connective.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::InvalidQuery`] if the tree contains
    /// [`FilterValue::Any`], which only has meaning inside mock expectations.
    pub fn write(
        &self,
        buffer: &mut Buffer,
        filter: &FilterQuery,
        query: &dyn QueryWriter,
    ) -> RelResult<()> {
        match filter {
            FilterQuery::None => {}
            FilterQuery::And(inner) => self.write_logical(buffer, " AND ", inner, query)?,
            FilterQuery::Or(inner) => self.write_logical(buffer, " OR ", inner, query)?,
            FilterQuery::Not(inner) => {
                if !filter.is_none() {
                    buffer.write_str("NOT ");
                    self.write_logical(buffer, " AND ", inner, query)?;
                }
            }
            FilterQuery::Compare { op, field, value } => {
                buffer.write_escape(field);
                buffer.write_str(op.as_sql());
                self.write_value(buffer, value, query)?;
            }
            FilterQuery::Nil(field) => {
                buffer.write_escape(field);
                buffer.write_str(" IS NULL");
            }
            FilterQuery::NotNil(field) => {
                buffer.write_escape(field);
                buffer.write_str(" IS NOT NULL");
            }
            FilterQuery::Like { field, pattern } => {
                buffer.write_escape(field);
                buffer.write_str(" LIKE ");
                self.write_value(buffer, pattern, query)?;
            }
            FilterQuery::NotLike { field, pattern } => {
                buffer.write_escape(field);
                buffer.write_str(" NOT LIKE ");
                self.write_value(buffer, pattern, query)?;
            }
            FilterQuery::In { field, values } => {
                self.write_inclusion(buffer, field, " IN ", "1=0", values, query)?;
            }
            FilterQuery::Nin { field, values } => {
                self.write_inclusion(buffer, field, " NOT IN ", "1=1", values, query)?;
            }
            FilterQuery::Fragment { expr, args } => {
                buffer.write_str(expr);
                buffer.add_arguments(args.iter().cloned());
            }
        }
        Ok(())
    }

    fn write_logical(
        &self,
        buffer: &mut Buffer,
        separator: &str,
        inner: &[FilterQuery],
        query: &dyn QueryWriter,
    ) -> RelResult<()> {
        let children: Vec<&FilterQuery> = inner.iter().filter(|f| !f.is_none()).collect();
        let grouped = children.len() > 1;
        if grouped {
            buffer.write_char('(');
        }
        for (i, child) in children.into_iter().enumerate() {
            if i > 0 {
                buffer.write_str(separator);
            }
            self.write(buffer, child, query)?;
        }
        if grouped {
            buffer.write_char(')');
        }
        Ok(())
    }

    fn write_inclusion(
        &self,
        buffer: &mut Buffer,
        field: &str,
        operator: &str,
        empty: &str,
        values: &[FilterValue],
        query: &dyn QueryWriter,
    ) -> RelResult<()> {
        // An empty set can never (or always) match.
        if values.is_empty() {
            buffer.write_str(empty);
            return Ok(());
        }

        buffer.write_escape(field);
        buffer.write_str(operator);

        if let [value @ (FilterValue::Query(_) | FilterValue::SubQuery(_))] = values {
            return self.write_value(buffer, value, query);
        }

        buffer.write_char('(');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            self.write_value(buffer, value, query)?;
        }
        buffer.write_char(')');
        Ok(())
    }

    fn write_value(
        &self,
        buffer: &mut Buffer,
        value: &FilterValue,
        query: &dyn QueryWriter,
    ) -> RelResult<()> {
        match value {
            FilterValue::Value(v) => buffer.write_value(v),
            FilterValue::Query(q) => {
                buffer.write_char('(');
                query.write(buffer, q)?;
                buffer.write_char(')');
            }
            FilterValue::SubQuery(sub) => {
                buffer.write_str(&sub.prefix);
                buffer.write_char('(');
                query.write(buffer, &sub.query)?;
                buffer.write_char(')');
            }
            FilterValue::Any => {
                return Err(RelError::InvalidQuery(
                    "FilterValue::Any is a mock wildcard and cannot be compiled".to_string(),
                ));
            }
        }
        Ok(())
    }
}
