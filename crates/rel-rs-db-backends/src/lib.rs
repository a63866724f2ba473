//! # rel-rs-db-backends
//!
//! Dialect adapters for rel-rs. Each dialect configures the generic builders
//! from `rel-rs-db` (placeholders, quoting, type mapping, conflict wording)
//! and classifies its driver's constraint errors. The [`Adapter`] runs the
//! compiled statements on a [`Connection`].
//!
//! Supported dialects:
//! - `PostgreSQL` ([`postgresql`]), with an optional `tokio-postgres` driver
//!   behind the `postgres` feature
//! - `MySQL` ([`mysql`])
//! - `SQLite` ([`sqlite`])
//!
//! ## Example
//!
//! ```
//! use rel_rs_db::mutate::set_all;
//! use rel_rs_db::{DatabaseBackendType, OnConflict, Value};
//! use rel_rs_db_backends::Dialect;
//!
//! let dialect = Dialect::for_backend(DatabaseBackendType::PostgreSQL);
//! let (sql, args) = dialect.insert.build(
//!     "todos",
//!     "id",
//!     &set_all([("title", Value::from("Sleep"))]),
//!     &OnConflict::default(),
//! ).unwrap();
//! assert_eq!(sql, r#"INSERT INTO "todos" ("title") VALUES ($1) RETURNING "id";"#);
//! assert_eq!(args, vec![Value::from("Sleep")]);
//! ```

// These clippy lints are intentionally allowed for the adapters crate:
// - doc_markdown: dialect names and SQL keywords in docs
// - missing_const_for_fn: constructors hold Arc'd state
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod adapter;
pub mod base;
pub mod instrument;
pub mod mysql;
pub mod postgresql;
pub mod sqlite;

pub use adapter::{backfill_ids, Adapter};
pub use base::{Connection, Dialect, DialectOptions, ErrorMapper, ExecResult, Increment};
pub use instrument::{Finish, Instrumenter};
#[cfg(feature = "postgres")]
pub use postgresql::PostgresConnection;
