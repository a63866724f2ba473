//! CREATE / ALTER / RENAME / DROP TABLE compilation.

use std::fmt;

use super::buffer::{Buffer, BufferFactory};
use crate::schema::{Column, Definition, Key, KeyType, SchemaOp, Table};
use crate::value::Value;

/// Maps a column to its native type and modifiers. See [`super::column_mapper`].
pub type ColumnMapper = fn(&mut Column) -> (String, u32, u32);

/// Table DDL compiler. Values (column defaults) are rendered inline.
#[derive(Clone)]
pub struct TableBuilder {
    buffer_factory: BufferFactory,
    column_mapper: ColumnMapper,
}

impl fmt::Debug for TableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBuilder")
            .field("buffer_factory", &self.buffer_factory)
            .finish_non_exhaustive()
    }
}

impl TableBuilder {
    /// Creates a builder with a dialect column mapper.
    pub const fn new(buffer_factory: BufferFactory, column_mapper: ColumnMapper) -> Self {
        Self {
            buffer_factory,
            column_mapper,
        }
    }

    /// Compiles `table` into one or more `;`-terminated statements. Column
    /// defaults are inlined; the argument list holds anything still bound.
    pub fn build(&self, table: &Table) -> (String, Vec<Value>) {
        let mut buffer = self.buffer_factory.create_inline();

        match table.op {
            SchemaOp::Create => self.write_create_table(&mut buffer, table),
            SchemaOp::Alter => self.write_alter_table(&mut buffer, table),
            SchemaOp::Rename => {
                buffer.write_str("ALTER TABLE ");
                buffer.write_escape(&table.name);
                buffer.write_str(" RENAME TO ");
                buffer.write_escape(&table.rename);
                buffer.write_char(';');
            }
            SchemaOp::Drop => {
                buffer.write_str("DROP TABLE ");
                if table.optional {
                    buffer.write_str("IF EXISTS ");
                }
                buffer.write_escape(&table.name);
                buffer.write_char(';');
            }
        }

        buffer.into_parts()
    }

    fn write_create_table(&self, buffer: &mut Buffer, table: &Table) {
        buffer.write_str("CREATE TABLE ");
        if table.optional {
            buffer.write_str("IF NOT EXISTS ");
        }
        buffer.write_escape(&table.name);

        if !table.definitions.is_empty() {
            buffer.write_str(" (");
            for (i, definition) in table.definitions.iter().enumerate() {
                if i > 0 {
                    buffer.write_str(", ");
                }
                match definition {
                    Definition::Column(column) => self.write_column(buffer, column),
                    Definition::Key(key) => self.write_key(buffer, key),
                    Definition::Raw(sql) => buffer.write_str(sql),
                }
            }
            buffer.write_char(')');
        }

        write_options(buffer, &table.options);
        buffer.write_char(';');
    }

    fn write_alter_table(&self, buffer: &mut Buffer, table: &Table) {
        for definition in &table.definitions {
            let mut statement = self.buffer_factory.create_inline();
            statement.write_str("ALTER TABLE ");
            statement.write_escape(&table.name);
            statement.write_char(' ');

            let supported = match definition {
                Definition::Column(column) => self.write_alter_column(&mut statement, column),
                Definition::Key(key) => self.write_alter_key(&mut statement, key),
                Definition::Raw(sql) => {
                    statement.write_str(sql);
                    true
                }
            };
            if !supported {
                tracing::warn!(table = %table.name, ?definition, "skipping unsupported ALTER TABLE definition");
                continue;
            }

            write_options(&mut statement, &table.options);
            statement.write_char(';');
            buffer.write_str(statement.sql());
            buffer.add_arguments(statement.arguments().iter().cloned());
        }
    }

    fn write_alter_column(&self, buffer: &mut Buffer, column: &Column) -> bool {
        match column.op {
            SchemaOp::Create => {
                buffer.write_str("ADD COLUMN ");
                self.write_column(buffer, column);
            }
            SchemaOp::Rename => {
                buffer.write_str("RENAME COLUMN ");
                buffer.write_escape(&column.name);
                buffer.write_str(" TO ");
                buffer.write_escape(&column.rename);
            }
            SchemaOp::Drop => {
                buffer.write_str("DROP COLUMN ");
                buffer.write_escape(&column.name);
            }
            SchemaOp::Alter => return false,
        }
        true
    }

    fn write_alter_key(&self, buffer: &mut Buffer, key: &Key) -> bool {
        match key.op {
            SchemaOp::Create => {
                buffer.write_str("ADD ");
                self.write_key(buffer, key);
            }
            SchemaOp::Drop if !key.name.is_empty() => {
                buffer.write_str("DROP CONSTRAINT ");
                buffer.write_escape(&key.name);
            }
            _ => return false,
        }
        true
    }

    /// `name TYPE[(m[,n])] [UNSIGNED] [UNIQUE] [NOT NULL] [PRIMARY KEY] [DEFAULT v] [options]`
    pub fn write_column(&self, buffer: &mut Buffer, column: &Column) {
        let mut column = column.clone();
        let (typ, m, n) = (self.column_mapper)(&mut column);

        buffer.write_escape(&column.name);
        buffer.write_char(' ');
        buffer.write_str(&typ);

        if m != 0 {
            buffer.write_char('(');
            buffer.write_str(&m.to_string());
            if n != 0 {
                buffer.write_char(',');
                buffer.write_str(&n.to_string());
            }
            buffer.write_char(')');
        }

        if column.unsigned {
            buffer.write_str(" UNSIGNED");
        }
        if column.unique {
            buffer.write_str(" UNIQUE");
        }
        if column.required {
            buffer.write_str(" NOT NULL");
        }
        if column.primary {
            buffer.write_str(" PRIMARY KEY");
        }
        if let Some(default) = &column.default {
            buffer.write_str(" DEFAULT ");
            buffer.write_value(default);
        }

        write_options(buffer, &column.options);
    }

    /// `TYPE [name] (columns) [REFERENCES t (columns) [ON DELETE a] [ON UPDATE b]] [options]`
    pub fn write_key(&self, buffer: &mut Buffer, key: &Key) {
        buffer.write_str(key.kind.as_sql());
        if !key.name.is_empty() {
            buffer.write_char(' ');
            buffer.write_escape(&key.name);
        }

        buffer.write_str(" (");
        write_column_list(buffer, &key.columns);
        buffer.write_char(')');

        if key.kind == KeyType::Foreign {
            let reference = &key.reference;
            buffer.write_str(" REFERENCES ");
            buffer.write_escape(&reference.table);
            buffer.write_str(" (");
            write_column_list(buffer, &reference.columns);
            buffer.write_char(')');

            if !reference.on_delete.is_empty() {
                buffer.write_str(" ON DELETE ");
                buffer.write_str(&reference.on_delete);
            }
            if !reference.on_update.is_empty() {
                buffer.write_str(" ON UPDATE ");
                buffer.write_str(&reference.on_update);
            }
        }

        write_options(buffer, &key.options);
    }
}

pub(super) fn write_column_list(buffer: &mut Buffer, columns: &[String]) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            buffer.write_str(", ");
        }
        buffer.write_escape(column);
    }
}

pub(super) fn write_options(buffer: &mut Buffer, options: &str) {
    if !options.is_empty() {
        buffer.write_char(' ');
        buffer.write_str(options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{column_mapper, Quote};
    use crate::schema::ColumnType;

    fn builder() -> TableBuilder {
        TableBuilder::new(BufferFactory::new(Quote::MYSQL), column_mapper)
    }

    // ── CREATE TABLE ─────────────────────────────────────────────────

    #[test]
    fn test_create_table() {
        let mut t = Table::new("todos", SchemaOp::Create);
        t.id("id");
        t.string("title").required();
        t.bool("completed").default(false);
        t.int("order").unsigned();
        t.options("ENGINE=InnoDB");
        assert_eq!(
            builder().build(&t).0,
            "CREATE TABLE `todos` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY, \
             `title` VARCHAR(255) NOT NULL, `completed` BOOL DEFAULT false, \
             `order` INT UNSIGNED) ENGINE=InnoDB;"
        );
    }

    #[test]
    fn test_create_table_if_not_exists_without_definitions() {
        let mut t = Table::new("todos", SchemaOp::Create);
        t.optional = true;
        assert_eq!(builder().build(&t).0, "CREATE TABLE IF NOT EXISTS `todos`;");
    }

    #[test]
    fn test_create_table_with_keys_and_raw() {
        let mut t = Table::new("points", SchemaOp::Create);
        t.decimal("value").precision(10).scale(2).default(0);
        t.int("score_id");
        t.primary_key(["score_id", "value"]);
        t.foreign_key("score_id", "scores", "id")
            .name("fk_score")
            .on_delete("CASCADE")
            .on_update("NO ACTION");
        t.fragment("CHECK (value >= 0)");
        assert_eq!(
            builder().build(&t).0,
            "CREATE TABLE `points` (`value` DECIMAL(10,2) DEFAULT 0, `score_id` INT, \
             PRIMARY KEY (`score_id`, `value`), \
             FOREIGN KEY `fk_score` (`score_id`) REFERENCES `scores` (`id`) ON DELETE CASCADE ON UPDATE NO ACTION, \
             CHECK (value >= 0));"
        );
    }

    #[test]
    fn test_column_default_string_is_quoted_inline() {
        let mut t = Table::new("todos", SchemaOp::Create);
        t.string("status").limit(10).default("it's");
        assert_eq!(
            builder().build(&t).0,
            "CREATE TABLE `todos` (`status` VARCHAR(10) DEFAULT 'it\\'s');"
        );
    }

    // ── ALTER / RENAME / DROP ────────────────────────────────────────

    #[test]
    fn test_alter_table_one_statement_per_definition() {
        let mut t = Table::new("todos", SchemaOp::Alter);
        t.text("notes");
        t.rename_column("order", "position");
        t.drop_column("legacy");
        t.unique(["title"]);
        assert_eq!(
            builder().build(&t).0,
            "ALTER TABLE `todos` ADD COLUMN `notes` TEXT;\
             ALTER TABLE `todos` RENAME COLUMN `order` TO `position`;\
             ALTER TABLE `todos` DROP COLUMN `legacy`;\
             ALTER TABLE `todos` ADD UNIQUE (`title`);"
        );
    }

    #[test]
    fn test_alter_skips_unsupported_definition() {
        let mut t = Table::new("todos", SchemaOp::Alter);
        t.column("x", ColumnType::Int).op = SchemaOp::Alter;
        assert_eq!(builder().build(&t).0, "");
    }

    #[test]
    fn test_rename_and_drop() {
        let mut t = Table::new("todos", SchemaOp::Rename);
        t.rename = "tasks".into();
        assert_eq!(builder().build(&t).0, "ALTER TABLE `todos` RENAME TO `tasks`;");

        let mut t = Table::new("todos", SchemaOp::Drop);
        assert_eq!(builder().build(&t).0, "DROP TABLE `todos`;");
        t.optional = true;
        assert_eq!(builder().build(&t).0, "DROP TABLE IF EXISTS `todos`;");
    }
}
