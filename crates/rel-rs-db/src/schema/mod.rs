//! Schema changes: tables, columns, keys and indexes.
//!
//! A [`Schema`] collects an ordered list of [`Migration`]s through a small
//! DSL. Each migration is compiled by a dialect's table or index builder and
//! applied with the adapter's `schema_apply`.
//!
//! # Examples
//!
//! ```
//! use rel_rs_db::schema::{Migration, Schema};
//!
//! let mut schema = Schema::default();
//! schema.create_table("todos", |t| {
//!     t.id("id");
//!     t.string("title").required();
//!     t.bool("completed").default(false);
//!     t.int("order");
//! });
//! schema.create_index("todos", "order_idx", ["order"]);
//!
//! assert_eq!(schema.migrations.len(), 2);
//! assert!(matches!(schema.migrations[0], Migration::Table(_)));
//! ```

mod index;
mod table;

pub use index::Index;
pub use table::{Column, ColumnType, Definition, ForeignKeyReference, Key, KeyType, Table};

/// The kind of change a schema object describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaOp {
    /// CREATE / ADD
    #[default]
    Create,
    /// ALTER
    Alter,
    /// RENAME
    Rename,
    /// DROP
    Drop,
}

/// One applied unit of a schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Migration {
    /// A table change.
    Table(Table),
    /// An index change.
    Index(Index),
    /// Raw SQL executed as given.
    Raw(String),
}

/// An ordered list of schema changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// The changes, in application order.
    pub migrations: Vec<Migration>,
}

impl Schema {
    fn push_table(&mut self, table: Table, define: impl FnOnce(&mut Table)) {
        let mut table = table;
        define(&mut table);
        self.migrations.push(Migration::Table(table));
    }

    /// `CREATE TABLE name (...)`
    pub fn create_table(&mut self, name: impl Into<String>, define: impl FnOnce(&mut Table)) {
        self.push_table(Table::new(name, SchemaOp::Create), define);
    }

    /// `CREATE TABLE IF NOT EXISTS name (...)`
    pub fn create_table_if_not_exists(
        &mut self,
        name: impl Into<String>,
        define: impl FnOnce(&mut Table),
    ) {
        let mut table = Table::new(name, SchemaOp::Create);
        table.optional = true;
        self.push_table(table, define);
    }

    /// `ALTER TABLE name ...`, one statement per definition.
    pub fn alter_table(&mut self, name: impl Into<String>, define: impl FnOnce(&mut Table)) {
        self.push_table(Table::new(name, SchemaOp::Alter), define);
    }

    /// `ALTER TABLE name RENAME TO new_name`
    pub fn rename_table(&mut self, name: impl Into<String>, new_name: impl Into<String>) {
        let mut table = Table::new(name, SchemaOp::Rename);
        table.rename = new_name.into();
        self.migrations.push(Migration::Table(table));
    }

    /// `DROP TABLE name`
    pub fn drop_table(&mut self, name: impl Into<String>) {
        self.migrations
            .push(Migration::Table(Table::new(name, SchemaOp::Drop)));
    }

    /// `DROP TABLE IF EXISTS name`
    pub fn drop_table_if_exists(&mut self, name: impl Into<String>) {
        let mut table = Table::new(name, SchemaOp::Drop);
        table.optional = true;
        self.migrations.push(Migration::Table(table));
    }

    /// Adds a single column to an existing table.
    pub fn add_column(
        &mut self,
        table: impl Into<String>,
        name: impl Into<String>,
        kind: ColumnType,
        define: impl FnOnce(&mut Column),
    ) {
        self.alter_table(table, |t| define(t.column(name, kind)));
    }

    /// Renames a column of an existing table.
    pub fn rename_column(
        &mut self,
        table: impl Into<String>,
        name: impl Into<String>,
        new_name: impl Into<String>,
    ) {
        self.alter_table(table, |t| {
            t.rename_column(name, new_name);
        });
    }

    /// Drops a column of an existing table.
    pub fn drop_column(&mut self, table: impl Into<String>, name: impl Into<String>) {
        self.alter_table(table, |t| {
            t.drop_column(name);
        });
    }

    /// `CREATE INDEX name ON table (columns)`
    pub fn create_index<S: Into<String>>(
        &mut self,
        table: impl Into<String>,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) {
        self.index(Index::new(table, name, columns));
    }

    /// `CREATE UNIQUE INDEX name ON table (columns)`
    pub fn create_unique_index<S: Into<String>>(
        &mut self,
        table: impl Into<String>,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) {
        self.index(Index::new(table, name, columns).unique());
    }

    /// `DROP INDEX name`
    pub fn drop_index(&mut self, table: impl Into<String>, name: impl Into<String>) {
        self.index(Index::drop(table, name));
    }

    /// Appends a fully configured index change.
    pub fn index(&mut self, index: Index) {
        self.migrations.push(Migration::Index(index));
    }

    /// Raw SQL executed as given.
    pub fn raw(&mut self, sql: impl Into<String>) {
        self.migrations.push(Migration::Raw(sql.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::nil;

    #[test]
    fn test_create_table_collects_definitions() {
        let mut schema = Schema::default();
        schema.create_table("todos", |t| {
            t.id("id");
            t.string("title");
            t.unique(["title"]);
        });
        match &schema.migrations[0] {
            Migration::Table(t) => {
                assert_eq!(t.name, "todos");
                assert_eq!(t.op, SchemaOp::Create);
                assert!(!t.optional);
                assert_eq!(t.definitions.len(), 3);
            }
            other => panic!("Expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_variants() {
        let mut schema = Schema::default();
        schema.create_table_if_not_exists("todos", |_| {});
        schema.drop_table_if_exists("todos");
        for m in &schema.migrations {
            match m {
                Migration::Table(t) => assert!(t.optional),
                other => panic!("Expected table, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rename_table() {
        let mut schema = Schema::default();
        schema.rename_table("todos", "tasks");
        match &schema.migrations[0] {
            Migration::Table(t) => {
                assert_eq!(t.op, SchemaOp::Rename);
                assert_eq!(t.rename, "tasks");
            }
            other => panic!("Expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_column_shortcuts_are_alters() {
        let mut schema = Schema::default();
        schema.add_column("todos", "notes", ColumnType::Text, |c| {
            c.required();
        });
        schema.rename_column("todos", "order", "position");
        schema.drop_column("todos", "legacy");
        assert_eq!(schema.migrations.len(), 3);
        for m in &schema.migrations {
            match m {
                Migration::Table(t) => assert_eq!(t.op, SchemaOp::Alter),
                other => panic!("Expected table, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_indexes_and_raw() {
        let mut schema = Schema::default();
        schema.create_unique_index("todos", "title_idx", ["title"]);
        schema.index(Index::new("todos", "open_idx", ["id"]).filter(nil("completed_at")));
        schema.drop_index("todos", "title_idx");
        schema.raw("VACUUM;");
        match &schema.migrations[0] {
            Migration::Index(i) => assert!(i.unique),
            other => panic!("Expected index, got {other:?}"),
        }
        match &schema.migrations[1] {
            Migration::Index(i) => assert!(!i.filter.is_none()),
            other => panic!("Expected index, got {other:?}"),
        }
        match &schema.migrations[2] {
            Migration::Index(i) => assert_eq!(i.op, SchemaOp::Drop),
            other => panic!("Expected index, got {other:?}"),
        }
        assert_eq!(schema.migrations[3], Migration::Raw("VACUUM;".into()));
    }
}
