//! SELECT compilation.

use rel_rs_core::RelResult;

use super::buffer::{Buffer, BufferFactory};
use super::filter::FilterBuilder;
use crate::query::{GroupQuery, JoinQuery, Query, SelectQuery, SortQuery};
use crate::value::Value;

/// Anything that can render a [`Query`] into a buffer.
///
/// Filters call back into this to render nested sub-queries.
pub trait QueryWriter {
    /// Writes `query` into `buffer`. A `;` is appended only when the buffer
    /// was empty on entry, so nested queries stay unterminated.
    ///
    /// # Errors
    ///
    /// Returns [`rel_rs_core::RelError::InvalidQuery`] for a filter that
    /// cannot be compiled.
    fn write(&self, buffer: &mut Buffer, query: &Query) -> RelResult<()>;
}

/// SELECT compiler.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    buffer_factory: BufferFactory,
    filter: FilterBuilder,
}

impl QueryBuilder {
    /// Creates a builder using `buffer_factory` for new statements.
    pub const fn new(buffer_factory: BufferFactory) -> Self {
        Self {
            buffer_factory,
            filter: FilterBuilder,
        }
    }

    /// Compiles `query` into a terminated statement and its arguments.
    ///
    /// # Errors
    ///
    /// See [`QueryWriter::write`].
    pub fn build(&self, query: &Query) -> RelResult<(String, Vec<Value>)> {
        let mut buffer = self.buffer_factory.create();
        self.write(&mut buffer, query)?;
        Ok(buffer.into_parts())
    }

    /// Writes every clause after the SELECT list.
    ///
    /// # Errors
    ///
    /// See [`QueryWriter::write`].
    pub fn write_query(&self, buffer: &mut Buffer, query: &Query) -> RelResult<()> {
        buffer.write_str(" FROM ");
        buffer.write_escape(&query.table);
        self.write_joins(buffer, &query.table, &query.joins)?;

        if !query.filter.is_none() {
            buffer.write_str(" WHERE ");
            self.filter.write(buffer, &query.filter, self)?;
        }

        self.write_group_by(buffer, &query.group)?;
        self.write_order_by(buffer, &query.sorts);

        if query.limit > 0 {
            buffer.write_str(" LIMIT ");
            buffer.write_str(&query.limit.to_string());
            if query.offset > 0 {
                buffer.write_str(" OFFSET ");
                buffer.write_str(&query.offset.to_string());
            }
        }

        if let Some(lock) = query.lock.as_deref().filter(|l| !l.is_empty()) {
            buffer.write_char(' ');
            buffer.write_str(lock);
        }
        Ok(())
    }

    fn write_select(&self, buffer: &mut Buffer, table: &str, select: &SelectQuery) {
        buffer.write_str("SELECT ");
        if select.distinct {
            buffer.write_str("DISTINCT ");
        }

        if select.fields.is_empty() {
            buffer.write_field(table, "*");
            return;
        }

        for (i, field) in select.fields.iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            buffer.write_field(table, field);
        }
    }

    fn write_joins(&self, buffer: &mut Buffer, table: &str, joins: &[JoinQuery]) -> RelResult<()> {
        for join in joins {
            buffer.write_char(' ');
            buffer.write_str(&join.mode);

            if !join.table.is_empty() {
                let (from, to) = infer_join_columns(table, join);
                buffer.write_char(' ');
                buffer.write_escape(&join.table);
                buffer.write_str(" ON ");
                buffer.write_escape(&from);
                buffer.write_char('=');
                buffer.write_escape(&to);

                if !join.filter.is_none() {
                    buffer.write_str(" AND ");
                    self.filter.write(buffer, &join.filter, self)?;
                }
            }

            buffer.add_arguments(join.arguments.iter().cloned());
        }
        Ok(())
    }

    fn write_group_by(&self, buffer: &mut Buffer, group: &GroupQuery) -> RelResult<()> {
        if group.fields.is_empty() {
            return Ok(());
        }

        buffer.write_str(" GROUP BY ");
        for (i, field) in group.fields.iter().enumerate() {
            if i > 0 {
                buffer.write_char(',');
            }
            buffer.write_escape(field);
        }

        if !group.filter.is_none() {
            buffer.write_str(" HAVING ");
            self.filter.write(buffer, &group.filter, self)?;
        }
        Ok(())
    }

    fn write_order_by(&self, buffer: &mut Buffer, sorts: &[SortQuery]) {
        if sorts.is_empty() {
            return;
        }

        buffer.write_str(" ORDER BY ");
        for (i, sort) in sorts.iter().enumerate() {
            if i > 0 {
                buffer.write_str(", ");
            }
            buffer.write_escape(&sort.field);
            buffer.write_str(if sort.asc { " ASC" } else { " DESC" });
        }
    }
}

impl QueryWriter for QueryBuilder {
    fn write(&self, buffer: &mut Buffer, query: &Query) -> RelResult<()> {
        if let Some(sql) = &query.sql {
            buffer.write_str(&sql.statement);
            buffer.add_arguments(sql.values.iter().cloned());
            return Ok(());
        }

        let root = buffer.is_empty();
        self.write_select(buffer, &query.table, &query.select);
        self.write_query(buffer, query)?;

        if root {
            buffer.write_char(';');
        }
        Ok(())
    }
}

/// Fills in ON columns left empty by [`JoinQuery::new`]: `<table>.<singular>_id`
/// on the query side and `<join table>.id` on the joined side.
fn infer_join_columns(table: &str, join: &JoinQuery) -> (String, String) {
    if join.arguments.is_empty() && (join.from.is_empty() || join.to.is_empty()) {
        let singular = join.table.strip_suffix('s').unwrap_or(&join.table);
        (
            format!("{table}.{singular}_id"),
            format!("{}.id", join.table),
        )
    } else {
        (join.from.clone(), join.to.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Placeholder, Quote};
    use crate::query::filter::{eq, gt, like, nil};

    fn builder() -> QueryBuilder {
        QueryBuilder::new(BufferFactory::new(Quote::ANSI).placeholder(Placeholder::Ordinal))
    }

    // ── SELECT list ──────────────────────────────────────────────────

    #[test]
    fn test_select_all() {
        let (sql, args) = builder().build(&Query::from("todos")).unwrap();
        assert_eq!(sql, "SELECT \"todos\".* FROM \"todos\";");
        assert!(args.is_empty());
    }

    #[test]
    fn test_select_fields_distinct() {
        let q = Query::select(["id", "title", "^COUNT(*) AS n"])
            .table("todos")
            .distinct();
        let (sql, _) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT DISTINCT \"todos\".\"id\",\"todos\".\"title\",COUNT(*) AS n FROM \"todos\";"
        );
    }

    // ── Clauses ──────────────────────────────────────────────────────

    #[test]
    fn test_where_and_order() {
        let q = Query::from("todos")
            .filter(like("title", "%Sleep%"))
            .filter(eq("completed", false))
            .sort_asc("order");
        let (sql, args) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT \"todos\".* FROM \"todos\" WHERE (\"title\" LIKE $1 AND \"completed\"=$2) ORDER BY \"order\" ASC;"
        );
        assert_eq!(args, vec![Value::from("%Sleep%"), Value::Bool(false)]);
    }

    #[test]
    fn test_multiple_sorts() {
        let q = Query::from("todos").sort_asc("order").sort_desc("id");
        let (sql, _) = builder().build(&q).unwrap();
        assert!(sql.ends_with(" ORDER BY \"order\" ASC, \"id\" DESC;"));
    }

    #[test]
    fn test_group_having() {
        let q = Query::select(["type", "^COUNT(*)"])
            .table("scores")
            .group(["type"])
            .having(gt("^COUNT(*)", 1));
        let (sql, args) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT \"scores\".\"type\",COUNT(*) FROM \"scores\" GROUP BY \"type\" HAVING COUNT(*)>$1;"
        );
        assert_eq!(args, vec![Value::Int(1)]);
    }

    #[test]
    fn test_having_without_group_is_dropped() {
        let q = Query::from("scores").having(gt("n", 1));
        let (sql, args) = builder().build(&q).unwrap();
        assert_eq!(sql, "SELECT \"scores\".* FROM \"scores\";");
        assert!(args.is_empty());
    }

    #[test]
    fn test_limit_offset_lock() {
        let q = Query::from("todos").limit(10).offset(20).for_update();
        let (sql, _) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT \"todos\".* FROM \"todos\" LIMIT 10 OFFSET 20 FOR UPDATE;"
        );
    }

    #[test]
    fn test_offset_without_limit_is_dropped() {
        let (sql, _) = builder().build(&Query::from("todos").offset(5)).unwrap();
        assert_eq!(sql, "SELECT \"todos\".* FROM \"todos\";");
    }

    // ── Joins ────────────────────────────────────────────────────────

    #[test]
    fn test_join_inferred_columns() {
        let (sql, _) = builder().build(&Query::from("todos").join("users")).unwrap();
        assert_eq!(
            sql,
            "SELECT \"todos\".* FROM \"todos\" JOIN \"users\" ON \"todos\".\"user_id\"=\"users\".\"id\";"
        );
    }

    #[test]
    fn test_join_explicit_with_filter() {
        let q = Query::from("todos").join_with(
            JoinQuery::on("LEFT JOIN", "users", "todos.owner_id", "users.id")
                .filter(nil("users.deleted_at")),
        );
        let (sql, _) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT \"todos\".* FROM \"todos\" LEFT JOIN \"users\" ON \"todos\".\"owner_id\"=\"users\".\"id\" AND \"users\".\"deleted_at\" IS NULL;"
        );
    }

    #[test]
    fn test_join_fragment_arguments_precede_where() {
        let q = Query::from("todos")
            .join_with(JoinQuery::fragment(
                "JOIN users ON users.id = $1",
                vec![Value::Int(7)],
            ))
            .filter(eq("completed", true));
        let (sql, args) = builder().build(&q).unwrap();
        assert_eq!(
            sql,
            "SELECT \"todos\".* FROM \"todos\" JOIN users ON users.id = $1 WHERE \"completed\"=$2;"
        );
        assert_eq!(args, vec![Value::Int(7), Value::Bool(true)]);
    }

    // ── Raw SQL ──────────────────────────────────────────────────────

    #[test]
    fn test_raw_sql_override() {
        let q = Query::sql("SELECT 1 WHERE $1", vec![Value::Bool(true)]);
        let (sql, args) = builder().build(&q).unwrap();
        assert_eq!(sql, "SELECT 1 WHERE $1");
        assert_eq!(args, vec![Value::Bool(true)]);
    }
}
