//! UPDATE compilation.

use rel_rs_core::{RelError, RelResult};

use super::buffer::BufferFactory;
use super::filter::FilterBuilder;
use super::query::QueryBuilder;
use crate::mutate::{Mutate, Mutates};
use crate::query::filter::FilterQuery;
use crate::value::Value;

/// UPDATE compiler.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    buffer_factory: BufferFactory,
    query: QueryBuilder,
    filter: FilterBuilder,
}

impl UpdateBuilder {
    /// Creates a builder; `query` renders sub-queries inside the filter.
    pub const fn new(buffer_factory: BufferFactory, query: QueryBuilder) -> Self {
        Self {
            buffer_factory,
            query,
            filter: FilterBuilder,
        }
    }

    /// Compiles `UPDATE table SET ... [WHERE filter];`.
    ///
    /// `primary_field` is never assigned, even when present in `mutates`.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::InvalidQuery`] when nothing is left to assign or
    /// the filter cannot be compiled.
    pub fn build(
        &self,
        table: &str,
        primary_field: &str,
        mutates: &Mutates,
        filter: &FilterQuery,
    ) -> RelResult<(String, Vec<Value>)> {
        let assignments: Vec<(&String, &Mutate)> = mutates
            .iter()
            .filter(|(field, _)| primary_field.is_empty() || field.as_str() != primary_field)
            .collect();
        if assignments.is_empty() {
            return Err(RelError::InvalidQuery(format!(
                "update of {table}: no fields to assign"
            )));
        }

        let mut buffer = self.buffer_factory.create();
        buffer.write_str("UPDATE ");
        buffer.write_escape(table);
        buffer.write_str(" SET ");

        for (i, (field, mutate)) in assignments.into_iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            match mutate {
                Mutate::Set(value) => {
                    buffer.write_escape(field);
                    buffer.write_char('=');
                    buffer.write_value(value);
                }
                Mutate::Inc(delta) => {
                    buffer.write_escape(field);
                    buffer.write_char('=');
                    buffer.write_escape(field);
                    buffer.write_char('+');
                    buffer.write_value(delta);
                }
                Mutate::Fragment(args) => {
                    buffer.write_str(field);
                    buffer.add_arguments(args.iter().cloned());
                }
            }
        }

        if !filter.is_none() {
            buffer.write_str(" WHERE ");
            self.filter.write(&mut buffer, filter, &self.query)?;
        }

        buffer.write_char(';');
        Ok(buffer.into_parts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Placeholder, Quote};
    use crate::mutate::set_all;
    use crate::query::filter::eq;

    fn builder() -> UpdateBuilder {
        let factory = BufferFactory::new(Quote::ANSI).placeholder(Placeholder::Ordinal);
        UpdateBuilder::new(factory.clone(), QueryBuilder::new(factory))
    }

    #[test]
    fn test_update_set_and_where() {
        let mutates = set_all([("title", Value::from("Wake")), ("completed", Value::Bool(true))]);
        let (sql, args) = builder().build("todos", "id", &mutates, &eq("id", 1)).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"todos\" SET \"completed\"=$1,\"title\"=$2 WHERE \"id\"=$3;"
        );
        assert_eq!(args, vec![Value::Bool(true), Value::from("Wake"), Value::Int(1)]);
    }

    #[test]
    fn test_update_skips_primary_field() {
        let mutates = set_all([("id", Value::Int(9)), ("title", Value::from("a"))]);
        let (sql, args) = builder().build("todos", "id", &mutates, &eq("id", 1)).unwrap();
        assert_eq!(sql, "UPDATE \"todos\" SET \"title\"=$1 WHERE \"id\"=$2;");
        assert_eq!(args, vec![Value::from("a"), Value::Int(1)]);
    }

    #[test]
    fn test_update_increment_and_fragment() {
        let mut mutates = Mutates::new();
        mutates.insert("hits".into(), Mutate::inc(2));
        mutates.insert("score=score*$2".into(), Mutate::fragment(vec![Value::Int(3)]));
        let (sql, args) = builder().build("todos", "id", &mutates, &FilterQuery::None).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"todos\" SET \"hits\"=\"hits\"+$1,score=score*$2;"
        );
        assert_eq!(args, vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_update_with_nothing_to_assign_is_rejected() {
        let only_primary = set_all([("id", Value::Int(9))]);
        for mutates in [only_primary, Mutates::new()] {
            let err = builder()
                .build("todos", "id", &mutates, &eq("id", 1))
                .unwrap_err();
            assert!(matches!(err, RelError::InvalidQuery(ref m) if m.contains("no fields")));
        }
    }

    #[test]
    fn test_update_primary_kept_without_primary_field() {
        let mutates = set_all([("id", Value::Int(9))]);
        let (sql, args) = builder()
            .build("todos", "", &mutates, &FilterQuery::None)
            .unwrap();
        assert_eq!(sql, "UPDATE \"todos\" SET \"id\"=$1;");
        assert_eq!(args, vec![Value::Int(9)]);
    }
}
