//! CREATE / DROP INDEX compilation.

use rel_rs_core::RelResult;

use super::buffer::BufferFactory;
use super::filter::FilterBuilder;
use super::query::QueryBuilder;
use super::table::{write_column_list, write_options};
use crate::schema::{Index, SchemaOp};
use crate::value::Value;

/// Index DDL compiler. Partial-index values are rendered inline; arguments
/// of fragment conditions stay bound.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    buffer_factory: BufferFactory,
    query: QueryBuilder,
    filter: FilterBuilder,
    /// `DROP INDEX name ON table` instead of `DROP INDEX name`.
    pub drop_index_on_table: bool,
    /// Whether `CREATE INDEX ... WHERE` is accepted.
    pub support_filter: bool,
}

impl IndexBuilder {
    /// Creates a builder.
    pub const fn new(
        buffer_factory: BufferFactory,
        query: QueryBuilder,
        drop_index_on_table: bool,
        support_filter: bool,
    ) -> Self {
        Self {
            buffer_factory,
            query,
            filter: FilterBuilder,
            drop_index_on_table,
            support_filter,
        }
    }

    /// Compiles `index` into a `;`-terminated statement and the arguments
    /// of any fragment in its condition.
    ///
    /// A filter on a dialect without partial indexes is dropped with a
    /// warning and the full index is created.
    ///
    /// # Errors
    ///
    /// Returns [`rel_rs_core::RelError::InvalidQuery`] for a condition that
    /// cannot be compiled.
    pub fn build(&self, index: &Index) -> RelResult<(String, Vec<Value>)> {
        let mut buffer = self.buffer_factory.create_inline();

        if index.op == SchemaOp::Drop {
            buffer.write_str("DROP INDEX ");
            if index.optional {
                buffer.write_str("IF EXISTS ");
            }
            buffer.write_escape(&index.name);
            if self.drop_index_on_table {
                buffer.write_str(" ON ");
                buffer.write_escape(&index.table);
            }
        } else {
            buffer.write_str("CREATE ");
            if index.unique {
                buffer.write_str("UNIQUE ");
            }
            buffer.write_str("INDEX ");
            if index.optional {
                buffer.write_str("IF NOT EXISTS ");
            }
            buffer.write_escape(&index.name);
            buffer.write_str(" ON ");
            buffer.write_escape(&index.table);
            buffer.write_str(" (");
            write_column_list(&mut buffer, &index.columns);
            buffer.write_char(')');

            if !index.filter.is_none() {
                if self.support_filter {
                    buffer.write_str(" WHERE ");
                    self.filter.write(&mut buffer, &index.filter, &self.query)?;
                } else {
                    tracing::warn!(
                        index = %index.name,
                        table = %index.table,
                        "partial index is not supported by this dialect; creating a full index"
                    );
                }
            }
        }

        write_options(&mut buffer, &index.options);
        buffer.write_char(';');
        Ok(buffer.into_parts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Quote;
    use crate::query::filter::{eq, fragment, nil};

    fn builder(drop_on_table: bool, support_filter: bool) -> IndexBuilder {
        let factory = BufferFactory::new(Quote::ANSI);
        IndexBuilder::new(
            factory.clone(),
            QueryBuilder::new(factory),
            drop_on_table,
            support_filter,
        )
    }

    #[test]
    fn test_create_index() {
        let index = Index::new("todos", "order_idx", ["order", "id"]);
        assert_eq!(
            builder(false, true).build(&index).unwrap().0,
            "CREATE INDEX \"order_idx\" ON \"todos\" (\"order\", \"id\");"
        );
    }

    #[test]
    fn test_create_unique_optional_with_options() {
        let index = Index::new("todos", "title_idx", ["title"])
            .unique()
            .optional()
            .options("USING btree");
        assert_eq!(
            builder(false, true).build(&index).unwrap().0,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"title_idx\" ON \"todos\" (\"title\") USING btree;"
        );
    }

    #[test]
    fn test_partial_index_inlines_values() {
        let index = Index::new("todos", "open_idx", ["id"])
            .filter(nil("completed_at") & eq("archived", false));
        assert_eq!(
            builder(false, true).build(&index).unwrap().0,
            "CREATE INDEX \"open_idx\" ON \"todos\" (\"id\") WHERE (\"completed_at\" IS NULL AND \"archived\"=false);"
        );
    }

    #[test]
    fn test_partial_index_dropped_when_unsupported() {
        let index = Index::new("todos", "open_idx", ["id"]).filter(nil("completed_at"));
        assert_eq!(
            builder(true, false).build(&index).unwrap().0,
            "CREATE INDEX \"open_idx\" ON \"todos\" (\"id\");"
        );
    }

    #[test]
    fn test_drop_index() {
        let index = Index::drop("todos", "order_idx");
        assert_eq!(builder(false, true).build(&index).unwrap().0, "DROP INDEX \"order_idx\";");
        assert_eq!(
            builder(true, false).build(&index.clone().optional()).unwrap().0,
            "DROP INDEX IF EXISTS \"order_idx\" ON \"todos\";"
        );
    }

    #[test]
    fn test_partial_index_fragment_keeps_arguments() {
        let index = Index::new("todos", "i", ["a"]).filter(fragment("a > ?", vec![5.into()]));
        let (sql, args) = builder(false, true).build(&index).unwrap();
        assert_eq!(sql, "CREATE INDEX \"i\" ON \"todos\" (\"a\") WHERE a > ?;");
        assert_eq!(args, vec![Value::Int(5)]);
    }

    #[test]
    fn test_partial_index_mixes_inline_values_and_fragment_arguments() {
        let index = Index::new("todos", "i", ["a"])
            .filter(eq("archived", false) & fragment("a > ?", vec![Value::Int(5)]));
        let (sql, args) = builder(false, true).build(&index).unwrap();
        assert_eq!(
            sql,
            "CREATE INDEX \"i\" ON \"todos\" (\"a\") WHERE (\"archived\"=false AND a > ?);"
        );
        assert_eq!(args, vec![Value::Int(5)]);
    }

    #[test]
    fn test_unsupported_partial_index_drops_fragment_arguments() {
        let index = Index::new("todos", "i", ["a"]).filter(fragment("a > ?", vec![Value::Int(5)]));
        let (sql, args) = builder(true, false).build(&index).unwrap();
        assert_eq!(sql, "CREATE INDEX \"i\" ON \"todos\" (\"a\");");
        assert!(args.is_empty());
    }
}
