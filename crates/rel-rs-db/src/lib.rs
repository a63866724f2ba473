//! # rel-rs-db
//!
//! The dialect-neutral half of rel-rs: the query IR and the statement
//! compilers that turn it into SQL.
//!
//! ## Architecture
//!
//! Callers describe work as plain values: a [`Query`](query::Query) with its
//! [`FilterQuery`](query::filter::FilterQuery) tree, a
//! [`Mutates`](mutate::Mutates) map for INSERT/UPDATE, or a
//! [`Schema`](schema::Schema) of table and index changes. Nothing here touches
//! a connection. The builders in [`builder`] render those values into SQL text
//! plus an ordered argument list; a dialect adapter (see `rel-rs-db-backends`)
//! picks the placeholder style, quoting and type mapping and executes the
//! result.
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - Result [`Row`](row::Row)s and [`DatabaseBackendType`](row::DatabaseBackendType)
//! - [`query`] - Queries, joins, sorts, groups and filter trees
//! - [`mutate`] - Row mutations and conflict handling
//! - [`schema`] - Tables, columns, keys, indexes and the schema DSL
//! - [`builder`] - Statement compilers
//! - [`matching`] - Structural matching used by test doubles

// These clippy lints are intentionally allowed for the compiler crate:
// - struct_excessive_bools: Column and Query mirror SQL's many boolean modifiers
// - too_many_lines: filter and table compilers are large match statements
// - doc_markdown: backtick requirements for SQL keywords in docs are too strict
// - needless_pass_by_value: constructor signatures take owned values for ergonomics
// - return_self_not_must_use: builder pattern methods are self-documenting
// - missing_const_for_fn: builders hold Arc'd state that keeps changing
// - match_same_arms: type mappers list every variant explicitly
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::use_self)]

pub mod builder;
pub mod matching;
pub mod mutate;
pub mod query;
pub mod row;
pub mod schema;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use matching::Matches;
pub use mutate::{ConflictAction, Mutate, Mutates, OnConflict};
pub use query::filter::{FilterQuery, FilterValue, SubQuery};
pub use query::{GroupQuery, JoinQuery, Query, SelectQuery, SortQuery, SqlQuery};
pub use row::{DatabaseBackendType, FromValue, Row};
pub use schema::{
    Column, ColumnType, Definition, Index, Key, KeyType, Migration, Schema, SchemaOp, Table,
};
pub use value::Value;
