//! Dialect configuration and the connection seam.
//!
//! A [`Dialect`] bundles every statement builder configured for one SQL
//! flavor together with the policies the adapter needs at execution time:
//! how to learn the auto-increment step and how to classify driver errors.
//! A [`Connection`] is whatever actually runs SQL; the adapter never talks to
//! a driver directly.

use std::fmt;
use std::sync::Arc;

use rel_rs_core::{RelError, RelResult};
use rel_rs_db::builder::{
    BufferFactory, ColumnMapper, DeleteBuilder, IndexBuilder, InsertAllBuilder, InsertBuilder,
    OnConflictBuilder, Placeholder, QueryBuilder, Quoter, TableBuilder, UpdateBuilder,
    ValueConverter,
};
use rel_rs_db::{DatabaseBackendType, Row, Value};

/// Rewrites a driver error, typically into [`RelError::Constraint`].
pub type ErrorMapper = fn(RelError) -> RelError;

/// The outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// The id generated by the first inserted row, when the driver reports one.
    pub last_insert_id: i64,
    /// Rows changed by the statement.
    pub rows_affected: u64,
}

/// Something that can run SQL.
///
/// All methods are async because database operations are I/O-bound. A
/// connection returned by [`Connection::begin`] is bound to the new
/// transaction until [`Connection::commit`] or [`Connection::rollback`].
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Executes a statement that does not return rows.
    async fn execute(&self, sql: &str, args: &[Value]) -> RelResult<ExecResult>;

    /// Executes a statement and returns all result rows.
    async fn query(&self, sql: &str, args: &[Value]) -> RelResult<Vec<Row>>;

    /// Starts a transaction.
    async fn begin(&self) -> RelResult<Arc<dyn Connection>>;

    /// Commits the transaction this connection is bound to.
    async fn commit(&self) -> RelResult<()>;

    /// Rolls back the transaction this connection is bound to.
    async fn rollback(&self) -> RelResult<()>;
}

/// How the adapter learns the auto-increment step for bulk id backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Increment {
    /// A known step.
    Fixed(i64),
    /// Ask the server; the first row's `Value` column holds the step.
    Query(&'static str),
}

/// Construction parameters for a [`Dialect`].
#[derive(Clone)]
pub struct DialectOptions {
    /// Identifier and literal quoting.
    pub quoter: Arc<dyn Quoter>,
    /// Parameter style.
    pub placeholder: Placeholder,
    /// Inline boolean literals `(true, false)`.
    pub bool_literals: (&'static str, &'static str),
    /// Inline value rewriting, e.g. timestamp formatting.
    pub value_converter: Option<ValueConverter>,
    /// `INSERT ... RETURNING <primary>`.
    pub returning: bool,
    /// `INSERT ... DEFAULT VALUES`.
    pub default_values: bool,
    /// Conflict clause wording.
    pub on_conflict: OnConflictBuilder,
    /// Column type mapping.
    pub column_mapper: ColumnMapper,
    /// `DROP INDEX name ON table`.
    pub drop_index_on_table: bool,
    /// `CREATE INDEX ... WHERE`.
    pub partial_index: bool,
    /// Auto-increment step source.
    pub increment: Increment,
    /// Driver error classification.
    pub error_mapper: ErrorMapper,
}

/// Every builder and policy for one SQL dialect.
#[derive(Clone)]
pub struct Dialect {
    /// Which dialect this is.
    pub backend: DatabaseBackendType,
    /// SELECT compiler.
    pub query: QueryBuilder,
    /// INSERT compiler.
    pub insert: InsertBuilder,
    /// Bulk INSERT compiler.
    pub insert_all: InsertAllBuilder,
    /// UPDATE compiler.
    pub update: UpdateBuilder,
    /// DELETE compiler.
    pub delete: DeleteBuilder,
    /// Table DDL compiler.
    pub table: TableBuilder,
    /// Index DDL compiler.
    pub index: IndexBuilder,
    /// Auto-increment step source.
    pub increment: Increment,
    /// Driver error classification.
    pub error_mapper: ErrorMapper,
    returning: bool,
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("backend", &self.backend)
            .field("returning", &self.returning)
            .field("increment", &self.increment)
            .finish_non_exhaustive()
    }
}

impl Dialect {
    /// Wires up every builder from `options`. All builders share one
    /// [`BufferFactory`] and therefore one escape cache.
    pub fn new(backend: DatabaseBackendType, options: DialectOptions) -> Self {
        let mut factory = BufferFactory::with_quoter(options.quoter)
            .placeholder(options.placeholder)
            .bool_literals(options.bool_literals.0, options.bool_literals.1);
        factory.value_converter = options.value_converter;

        let query = QueryBuilder::new(factory.clone());
        Self {
            backend,
            insert: InsertBuilder {
                buffer_factory: factory.clone(),
                returning_primary: options.returning,
                insert_default_values: options.default_values,
                on_conflict: options.on_conflict,
            },
            insert_all: InsertAllBuilder {
                buffer_factory: factory.clone(),
                returning_primary: options.returning,
                on_conflict: options.on_conflict,
            },
            update: UpdateBuilder::new(factory.clone(), query.clone()),
            delete: DeleteBuilder::new(factory.clone(), query.clone()),
            table: TableBuilder::new(factory.clone(), options.column_mapper),
            index: IndexBuilder::new(
                factory,
                query.clone(),
                options.drop_index_on_table,
                options.partial_index,
            ),
            query,
            increment: options.increment,
            error_mapper: options.error_mapper,
            returning: options.returning,
        }
    }

    /// The dialect for `backend`.
    pub fn for_backend(backend: DatabaseBackendType) -> Self {
        match backend {
            DatabaseBackendType::PostgreSQL => crate::postgresql::dialect(),
            DatabaseBackendType::MySQL => crate::mysql::dialect(),
            DatabaseBackendType::SQLite => crate::sqlite::dialect(),
        }
    }

    /// Whether generated ids come back through `RETURNING`.
    pub const fn returning(&self) -> bool {
        self.returning
    }
}
