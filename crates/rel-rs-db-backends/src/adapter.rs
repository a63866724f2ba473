//! The execution half of a dialect: compile, run, classify.
//!
//! An [`Adapter`] pairs a [`Dialect`] with a [`Connection`]. Every operation
//! compiles its input with the dialect's builders, runs the statement under
//! the [`Instrumenter`], and passes driver errors through the dialect's error
//! mapper so constraint violations surface as
//! [`RelError::Constraint`](rel_rs_core::RelError::Constraint).
//!
//! Transactions are values: [`Adapter::begin`] returns a new adapter bound to
//! the transaction. Beginning again on that adapter opens savepoint `s1`,
//! then `s2`, and so on.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rel_rs_core::logging::statement_span;
use rel_rs_core::{RelError, RelResult};
use rel_rs_db::{FromValue, Migration, Mutate, Mutates, OnConflict, Query, Row, Schema, Value};
use tokio::sync::OnceCell;
use tracing::Instrument;

use crate::base::{Connection, Dialect, ExecResult, Increment};
use crate::instrument::Instrumenter;

/// A dialect bound to a connection.
///
/// Cloning is cheap; clones share the connection and the cached
/// auto-increment step.
#[derive(Clone)]
pub struct Adapter {
    dialect: Arc<Dialect>,
    connection: Arc<dyn Connection>,
    instrumenter: Instrumenter,
    savepoint: usize,
    in_transaction: bool,
    increment: Arc<OnceCell<i64>>,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("dialect", &self.dialect)
            .field("instrumenter", &self.instrumenter)
            .field("in_transaction", &self.in_transaction)
            .field("savepoint", &self.savepoint)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Creates an adapter running `dialect` on `connection`.
    pub fn new(dialect: Dialect, connection: Arc<dyn Connection>) -> Self {
        Self {
            dialect: Arc::new(dialect),
            connection,
            instrumenter: Instrumenter::default(),
            savepoint: 0,
            in_transaction: false,
            increment: Arc::new(OnceCell::new()),
        }
    }

    /// Connects to the database described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::Configuration`] for an engine without a bundled
    /// driver, or the pool error.
    #[cfg(feature = "postgres")]
    pub fn connect(settings: &rel_rs_core::DatabaseSettings) -> RelResult<Self> {
        use rel_rs_db::DatabaseBackendType;

        match DatabaseBackendType::from_engine(&settings.engine)? {
            DatabaseBackendType::PostgreSQL => {
                let connection = crate::postgresql::PostgresConnection::from_settings(settings)?;
                Ok(Self::new(crate::postgresql::dialect(), Arc::new(connection)))
            }
            other => Err(RelError::Configuration(format!(
                "no bundled driver for {}; use Adapter::new with a custom Connection",
                other.name()
            ))),
        }
    }

    /// Loads a settings file, applies the `REL_*` environment overrides and
    /// connects to its `[database]`.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::Configuration`] for an unreadable or invalid file,
    /// otherwise see [`Adapter::connect`].
    #[cfg(feature = "postgres")]
    pub fn from_config(path: impl AsRef<std::path::Path>) -> RelResult<Self> {
        let settings = rel_rs_core::settings_loader::from_toml_file_with_env(path)?;
        Self::connect(&settings.database)
    }

    /// Replaces the instrumenter.
    #[must_use]
    pub fn instrumentation(mut self, instrumenter: Instrumenter) -> Self {
        self.instrumenter = instrumenter;
        self
    }

    /// The dialect.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Whether this adapter is bound to a transaction.
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Savepoint depth inside the transaction. `0` is the outer transaction.
    pub const fn savepoint(&self) -> usize {
        self.savepoint
    }

    // ── Physical operations ──────────────────────────────────────────

    /// Executes a statement that returns no rows.
    pub async fn exec(&self, statement: &str, args: &[Value]) -> RelResult<ExecResult> {
        let finish = self.instrumenter.observe("adapter-exec", statement);
        let result = self
            .connection
            .execute(statement, args)
            .instrument(statement_span("adapter-exec"))
            .await
            .map_err(self.dialect.error_mapper);
        finish.done(result.as_ref().err());
        result
    }

    /// Executes a statement and collects its rows.
    pub async fn query_rows(&self, statement: &str, args: &[Value]) -> RelResult<Vec<Row>> {
        let finish = self.instrumenter.observe("adapter-query", statement);
        let result = self
            .connection
            .query(statement, args)
            .instrument(statement_span("adapter-query"))
            .await
            .map_err(self.dialect.error_mapper);
        finish.done(result.as_ref().err());
        result
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Compiles and runs a SELECT.
    pub async fn query(&self, query: &Query) -> RelResult<Vec<Row>> {
        let (statement, args) = self.dialect.query.build(query)?;
        self.query_rows(&statement, &args).await
    }

    /// Runs `MODE(field)` over `query`, e.g. `aggregate(q, "SUM", "price")`.
    ///
    /// Grouped fields stay in the SELECT list; the first row's result is
    /// returned, or `0` when there are no rows.
    pub async fn aggregate(&self, query: &Query, mode: &str, field: &str) -> RelResult<i64> {
        let mut query = query.clone();
        let mut fields = vec![format!("^{mode}({field}) AS result")];
        fields.extend(query.group.fields.iter().cloned());
        query.select.fields = fields;

        let rows = self.query(&query).await?;
        match rows.first().and_then(|row| row.get_value("result")) {
            Some(value) => Ok(Option::<i64>::from_value(value)?.unwrap_or_default()),
            None => Ok(0),
        }
    }

    /// `COUNT(*)` over `query`.
    pub async fn count(&self, query: &Query) -> RelResult<i64> {
        self.aggregate(query, "COUNT", "*").await
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Inserts one row and returns its primary key.
    ///
    /// Dialects with RETURNING read the key from the statement. Others use
    /// the driver's last insert id.
    pub async fn insert(
        &self,
        table: &str,
        primary_field: &str,
        mutates: &Mutates,
        on_conflict: &OnConflict,
    ) -> RelResult<Value> {
        let (statement, args) = self
            .dialect
            .insert
            .build(table, primary_field, mutates, on_conflict)?;

        if self.dialect.returning() && !primary_field.is_empty() {
            let rows = self.query_rows(&statement, &args).await?;
            return Ok(rows
                .first()
                .map_or(Value::Null, |row| returned_id(row, primary_field)));
        }

        let result = self.exec(&statement, &args).await?;
        Ok(Value::Int(result.last_insert_id))
    }

    /// Inserts every row of `bulk` in one statement and returns their
    /// primary keys in row order.
    ///
    /// Without RETURNING the ids are derived from the first generated id and
    /// the auto-increment step. That assumes the server allocated a gapless
    /// run for this statement.
    pub async fn insert_all(
        &self,
        table: &str,
        primary_field: &str,
        fields: &[String],
        bulk: &[Mutates],
        on_conflict: &OnConflict,
    ) -> RelResult<Vec<Value>> {
        let (statement, args) =
            self.dialect
                .insert_all
                .build(table, primary_field, fields, bulk, on_conflict)?;

        if self.dialect.returning() && !primary_field.is_empty() {
            let rows = self.query_rows(&statement, &args).await?;
            return Ok(rows.iter().map(|row| returned_id(row, primary_field)).collect());
        }

        let result = self.exec(&statement, &args).await?;
        if primary_field.is_empty() {
            return Ok(vec![Value::Null; bulk.len()]);
        }

        let step = self.increment().await?;
        Ok(backfill_ids(result.last_insert_id, step, primary_field, bulk))
    }

    /// Updates the rows matched by `query` without the unsafe-mutation
    /// guard. `primary_field` is never assigned.
    pub async fn update(
        &self,
        query: &Query,
        primary_field: &str,
        mutates: &Mutates,
    ) -> RelResult<u64> {
        let (statement, args) =
            self.dialect
                .update
                .build(&query.table, primary_field, mutates, &query.filter)?;
        Ok(self.exec(&statement, &args).await?.rows_affected)
    }

    /// Updates every row matched by `query`.
    ///
    /// # Panics
    ///
    /// Panics when `query` has no table, or no filter and no
    /// [`Query::allow_unsafe`] opt-in.
    pub async fn update_any(&self, query: &Query, mutates: &Mutates) -> RelResult<u64> {
        ensure_safe("update_any", query);
        self.update(query, "", mutates).await
    }

    /// Deletes the rows matched by `query` without the unsafe-mutation guard.
    pub async fn delete(&self, query: &Query) -> RelResult<u64> {
        let (statement, args) = self.dialect.delete.build(&query.table, &query.filter)?;
        Ok(self.exec(&statement, &args).await?.rows_affected)
    }

    /// Deletes every row matched by `query`.
    ///
    /// # Panics
    ///
    /// Panics when `query` has no table, or no filter and no
    /// [`Query::allow_unsafe`] opt-in.
    pub async fn delete_any(&self, query: &Query) -> RelResult<u64> {
        ensure_safe("delete_any", query);
        self.delete(query).await
    }

    // ── Schema ───────────────────────────────────────────────────────

    /// Compiles and executes one migration step. Steps that compile to
    /// nothing are skipped.
    pub async fn schema_apply(&self, migration: &Migration) -> RelResult<()> {
        let (statement, args) = match migration {
            Migration::Table(table) => self.dialect.table.build(table),
            Migration::Index(index) => self.dialect.index.build(index)?,
            Migration::Raw(sql) => (sql.clone(), Vec::new()),
        };
        if statement.is_empty() {
            return Ok(());
        }
        self.exec(&statement, &args).await.map(|_| ())
    }

    /// Applies every migration in `schema`, stopping at the first error.
    pub async fn apply(&self, schema: &Schema) -> RelResult<()> {
        for migration in &schema.migrations {
            self.schema_apply(migration).await?;
        }
        Ok(())
    }

    // ── Transactions ─────────────────────────────────────────────────

    /// Starts a transaction, or a savepoint when already inside one.
    pub async fn begin(&self) -> RelResult<Self> {
        let finish = self.instrumenter.observe("adapter-begin", "begin");

        let result = if self.in_transaction {
            let savepoint = self.savepoint + 1;
            self.exec(&format!("SAVEPOINT s{savepoint};"), &[])
                .await
                .map(|_| Self {
                    savepoint,
                    ..self.clone()
                })
        } else {
            self.connection
                .begin()
                .instrument(statement_span("adapter-begin"))
                .await
                .map_err(self.dialect.error_mapper)
                .map(|connection| Self {
                    connection,
                    in_transaction: true,
                    savepoint: 0,
                    ..self.clone()
                })
        };

        finish.done(result.as_ref().err());
        result
    }

    /// Commits the transaction, or releases the current savepoint.
    pub async fn commit(&self) -> RelResult<()> {
        let finish = self.instrumenter.observe("adapter-commit", "commit");

        let result = if !self.in_transaction {
            Err(RelError::Transaction(
                "unable to commit outside transaction".to_string(),
            ))
        } else if self.savepoint > 0 {
            self.exec(&format!("RELEASE SAVEPOINT s{};", self.savepoint), &[])
                .await
                .map(|_| ())
        } else {
            self.connection
                .commit()
                .instrument(statement_span("adapter-commit"))
                .await
                .map_err(self.dialect.error_mapper)
        };

        finish.done(result.as_ref().err());
        result
    }

    /// Rolls back the transaction, or back to the current savepoint.
    pub async fn rollback(&self) -> RelResult<()> {
        let finish = self.instrumenter.observe("adapter-rollback", "rollback");

        let result = if !self.in_transaction {
            Err(RelError::Transaction(
                "unable to rollback outside transaction".to_string(),
            ))
        } else if self.savepoint > 0 {
            self.exec(&format!("ROLLBACK TO SAVEPOINT s{};", self.savepoint), &[])
                .await
                .map(|_| ())
        } else {
            self.connection
                .rollback()
                .instrument(statement_span("adapter-rollback"))
                .await
                .map_err(self.dialect.error_mapper)
        };

        finish.done(result.as_ref().err());
        result
    }

    /// Runs `f` in a transaction: commits when it returns `Ok`, rolls back
    /// when it returns `Err`. Nested calls use savepoints.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// adapter.transaction(|tx| async move {
    ///     tx.delete(&Query::from("todos").filter(eq("id", 1))).await?;
    ///     tx.insert("logs", "id", &set_all([("msg", Value::from("deleted"))]), &OnConflict::default()).await?;
    ///     Ok(())
    /// }).await?;
    /// ```
    pub async fn transaction<F, Fut, T>(&self, f: F) -> RelResult<T>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = RelResult<T>>,
    {
        let tx = self.begin().await?;
        match f(tx.clone()).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed after transaction error");
                }
                Err(err)
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    /// The auto-increment step. Queried at most once per adapter family.
    async fn increment(&self) -> RelResult<i64> {
        match &self.dialect.increment {
            Increment::Fixed(step) => Ok(*step),
            Increment::Query(statement) => self
                .increment
                .get_or_try_init(|| async {
                    let rows = self.query_rows(statement, &[]).await?;
                    rows.first()
                        .and_then(|row| row.get_value("Value"))
                        .map_or(Ok(1), i64::from_value)
                })
                .await
                .copied(),
        }
    }
}

fn ensure_safe(op: &str, query: &Query) {
    assert!(!query.table.is_empty(), "{op}: query has no table");
    assert!(
        query.allow_unsafe || !query.filter.is_none(),
        "{op} on '{}' without a filter; call allow_unsafe() to affect every row",
        query.table
    );
}

fn returned_id(row: &Row, primary_field: &str) -> Value {
    row.get_value(primary_field)
        .or_else(|| row.values().first())
        .cloned()
        .unwrap_or(Value::Null)
}

/// Derives the ids of a bulk insert from the first generated id.
///
/// A negative step means the server allocated ids downwards, so the run
/// starts `(n - 1) * |step|` below `first_id`. A row that set its own primary
/// key keeps it, and the rows after it continue from that key.
pub fn backfill_ids(first_id: i64, step: i64, primary_field: &str, bulk: &[Mutates]) -> Vec<Value> {
    let mut id = first_id;
    let mut step = step;
    if step < 0 {
        let n = i64::try_from(bulk.len()).unwrap_or(i64::MAX);
        id += (n - 1) * step;
        step = -step;
    }

    let mut counter = 0;
    bulk.iter()
        .map(|mutates| match mutates.get(primary_field) {
            Some(Mutate::Set(value)) => {
                if let Value::Int(explicit) = value {
                    id = *explicit;
                }
                counter = 1;
                value.clone()
            }
            _ => {
                let next = Value::Int(id + counter * step);
                counter += 1;
                next
            }
        })
        .collect()
}
