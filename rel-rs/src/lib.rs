//! # rel-rs
//!
//! A dialect-aware SQL statement compiler and adapter layer.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `rel-rs` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use rel_rs::prelude::*;
//!
//! let dialect = Dialect::for_backend(DatabaseBackendType::MySQL);
//! let (sql, args) = dialect.query.build(
//!     &Query::from("todos").filter(eq("completed", false)).sort_asc("order"),
//! ).unwrap();
//! assert_eq!(sql, "SELECT `todos`.* FROM `todos` WHERE `completed`=? ORDER BY `order` ASC;");
//! assert_eq!(args, vec![Value::Bool(false)]);
//! ```

/// Error types, settings, and logging setup.
pub use rel_rs_core as core;

/// Query IR, schema DSL, and the statement builders.
pub use rel_rs_db as db;

/// Dialects (`PostgreSQL`, `MySQL`, `SQLite`), the adapter, and instrumentation.
pub use rel_rs_db_backends as db_backends;

pub use async_trait::async_trait;
pub use chrono;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most programs need.
pub mod prelude {
    pub use rel_rs_core::{ConstraintKind, RelError, RelResult, Settings};
    pub use rel_rs_db::mutate::set_all;
    pub use rel_rs_db::query::filter::{
        and, eq, fragment, gt, gte, in_, like, lt, lte, ne, nil, nin, not, not_like, not_nil, or,
    };
    pub use rel_rs_db::{
        ColumnType, DatabaseBackendType, FilterQuery, Mutate, Mutates, OnConflict, Query, Row,
        Schema, Value,
    };
    pub use rel_rs_db_backends::{Adapter, Connection, Dialect, ExecResult, Instrumenter};
}
