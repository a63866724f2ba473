//! Statement compilers.
//!
//! Each builder renders one statement kind from the IR into SQL text plus an
//! ordered argument list. Builders are configured per dialect: a shared
//! [`BufferFactory`] fixes placeholders, quoting and literal rendering, and the
//! remaining knobs (RETURNING, DEFAULT VALUES, conflict wording, partial
//! indexes, column types) live on the individual builders.
//!
//! # Examples
//!
//! ```
//! use rel_rs_db::builder::{BufferFactory, Placeholder, Quote, QueryBuilder};
//! use rel_rs_db::query::{filter::eq, Query};
//!
//! let builder = QueryBuilder::new(BufferFactory::new(Quote::ANSI).placeholder(Placeholder::Ordinal));
//! let (sql, args) = builder.build(&Query::from("todos").filter(eq("id", 1))).unwrap();
//! assert_eq!(sql, r#"SELECT "todos".* FROM "todos" WHERE "id"=$1;"#);
//! assert_eq!(args.len(), 1);
//! ```

mod buffer;
mod delete;
mod filter;
mod index;
mod insert;
mod insert_all;
mod on_conflict;
mod query;
mod quote;
mod table;
mod update;
mod util;

pub use buffer::{
    Buffer, BufferFactory, EscapeCache, Placeholder, ValueConverter, UNESCAPE_CHARACTER,
};
pub use delete::DeleteBuilder;
pub use filter::FilterBuilder;
pub use index::IndexBuilder;
pub use insert::InsertBuilder;
pub use insert_all::InsertAllBuilder;
pub use on_conflict::OnConflictBuilder;
pub use query::{QueryBuilder, QueryWriter};
pub use quote::{Quote, Quoter};
pub use table::{ColumnMapper, TableBuilder};
pub use update::UpdateBuilder;
pub use util::{column_mapper, extract_string, DATE_LAYOUT, DATE_TIME_LAYOUT, TIME_LAYOUT};
