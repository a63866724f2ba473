//! PostgreSQL dialect.
//!
//! `$n` placeholders, `"` identifiers, `ON CONFLICT ... DO UPDATE SET` with the
//! `excluded` pseudo-table, `RETURNING` for generated ids and partial indexes.
//!
//! With the `postgres` feature this module also provides [`PostgresConnection`],
//! a [`Connection`](crate::base::Connection) over `deadpool-postgres` and
//! `tokio-postgres`.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use rel_rs_core::{ConstraintError, ConstraintKind, RelError};
use rel_rs_db::builder::{self, extract_string, OnConflictBuilder, Placeholder, Quoter};
use rel_rs_db::{Column, ColumnType, DatabaseBackendType, Value};

use crate::base::{Dialect, DialectOptions, Increment};

/// PostgreSQL quoting.
///
/// Identifiers are cut at the first NUL byte. Literals containing a backslash
/// use the escape-string form ` E'...'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresQuote;

impl Quoter for PostgresQuote {
    fn id(&self, name: &str) -> String {
        let name = name.split('\0').next().unwrap_or_default();
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn value(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        if escaped.contains('\\') {
            format!(" E'{}'", escaped.replace('\\', "\\\\"))
        } else {
            format!("'{escaped}'")
        }
    }
}

/// The PostgreSQL dialect.
pub fn dialect() -> Dialect {
    Dialect::new(
        DatabaseBackendType::PostgreSQL,
        DialectOptions {
            quoter: Arc::new(PostgresQuote),
            placeholder: Placeholder::Ordinal,
            bool_literals: ("true", "false"),
            value_converter: Some(value_converter),
            returning: true,
            default_values: true,
            on_conflict: OnConflictBuilder::EXCLUDED,
            column_mapper,
            drop_index_on_table: false,
            partial_index: true,
            increment: Increment::Fixed(1),
            error_mapper,
        },
    )
}

/// Formats a timestamp the way PostgreSQL prints `timestamptz`:
/// microsecond precision, trailing zeros trimmed, `Z` for UTC or a
/// `±HH:MM:SS` offset otherwise.
///
/// # Examples
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use rel_rs_db_backends::postgresql::format_time;
///
/// let tz = FixedOffset::east_opt(7 * 3600).unwrap();
/// let t = tz.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(format_time(&t), "2024-01-02 03:04:05+07:00:00");
/// ```
pub fn format_time(t: &DateTime<FixedOffset>) -> String {
    let micros = t.nanosecond() / 1_000;
    let mut out = t.format("%Y-%m-%d %H:%M:%S").to_string();

    if micros > 0 {
        let frac = format!("{micros:06}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }

    let offset = t.offset().fix().local_minus_utc();
    if offset == 0 {
        out.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let offset = offset.abs();
        out.push_str(&format!(
            "{sign}{:02}:{:02}:{:02}",
            offset / 3600,
            (offset % 3600) / 60,
            offset % 60
        ));
    }

    out
}

fn utc(naive: &NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(naive).into()
}

/// Renders timestamps as PostgreSQL text before they are inlined.
pub fn value_converter(value: &Value) -> Value {
    match value {
        Value::DateTime(dt) => Value::String(format_time(&utc(dt))),
        Value::DateTimeTz(dt) => Value::String(format_time(dt)),
        other => other.clone(),
    }
}

/// PostgreSQL column types: serial ids, `TIMESTAMPTZ`, `JSONB`, no unsigned
/// integers and no length on integers or text.
pub fn column_mapper(column: &mut Column) -> (String, u32, u32) {
    column.unsigned = false;
    if matches!(&column.default, Some(Value::String(s)) if s.is_empty()) {
        column.default = None;
    }

    match column.kind {
        ColumnType::Id => ("SERIAL NOT NULL".into(), 0, 0),
        ColumnType::BigId => ("BIGSERIAL NOT NULL".into(), 0, 0),
        ColumnType::DateTime => {
            let formatted = match &column.default {
                Some(Value::DateTime(dt)) => Some(format_time(&utc(dt))),
                Some(Value::DateTimeTz(dt)) => Some(format_time(dt)),
                Some(Value::Date(d)) => Some(format_time(&utc(&d.and_time(chrono::NaiveTime::MIN)))),
                _ => None,
            };
            if let Some(formatted) = formatted {
                column.default = Some(Value::String(formatted));
            }
            ("TIMESTAMPTZ".into(), 0, 0)
        }
        ColumnType::Int | ColumnType::BigInt | ColumnType::Text => {
            column.limit = 0;
            builder::column_mapper(column)
        }
        ColumnType::Json => ("JSONB".into(), 0, 0),
        _ => builder::column_mapper(column),
    }
}

/// Classifies `violates <kind> constraint "<name>"` errors.
pub fn error_mapper(err: RelError) -> RelError {
    match err {
        RelError::Database(message) => {
            let kind = match extract_string(&message, "violates ", " constraint") {
                "unique" => ConstraintKind::Unique,
                "foreign key" => ConstraintKind::ForeignKey,
                "check" => ConstraintKind::Check,
                _ => return RelError::Database(message),
            };
            let key = extract_string(&message, "constraint \"", "\"").to_string();
            RelError::Constraint(ConstraintError::new(key, kind, message))
        }
        other => other,
    }
}

#[cfg(feature = "postgres")]
pub use driver::PostgresConnection;

#[cfg(feature = "postgres")]
mod driver {
    use std::sync::Arc;

    use rel_rs_core::{DatabaseSettings, RelError, RelResult};
    use rel_rs_db::{Row, Value};
    use tokio_postgres::types::{ToSql, Type};

    use crate::base::{Connection, ExecResult};

    /// A PostgreSQL connection backed by a `deadpool-postgres` pool.
    ///
    /// Outside a transaction every call checks out a pooled client. A
    /// transaction pins one client until commit or rollback.
    #[derive(Clone)]
    pub struct PostgresConnection {
        pool: deadpool_postgres::Pool,
        pinned: Option<Arc<deadpool_postgres::Object>>,
    }

    impl std::fmt::Debug for PostgresConnection {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("PostgresConnection")
                .field("in_transaction", &self.pinned.is_some())
                .finish_non_exhaustive()
        }
    }

    impl PostgresConnection {
        /// Wraps an existing pool.
        pub const fn new(pool: deadpool_postgres::Pool) -> Self {
            Self { pool, pinned: None }
        }

        /// Creates a pool from database settings.
        ///
        /// # Errors
        ///
        /// Returns an error if the pool cannot be created.
        pub fn from_settings(settings: &DatabaseSettings) -> RelResult<Self> {
            let mut pg_config = deadpool_postgres::Config::new();
            pg_config.url = Some(settings.url.clone());
            pg_config.pool = Some(deadpool_postgres::PoolConfig::new(settings.max_connections));
            if settings.statement_timeout_ms > 0 {
                pg_config.options = Some(format!(
                    "-c statement_timeout={}",
                    settings.statement_timeout_ms
                ));
            }

            let pool = pg_config
                .create_pool(
                    Some(deadpool_postgres::Runtime::Tokio1),
                    tokio_postgres::NoTls,
                )
                .map_err(|e| RelError::Operational(format!("Failed to create pool: {e}")))?;

            Ok(Self::new(pool))
        }

        async fn client(&self) -> RelResult<Arc<deadpool_postgres::Object>> {
            if let Some(client) = &self.pinned {
                return Ok(Arc::clone(client));
            }
            self.pool
                .get()
                .await
                .map(Arc::new)
                .map_err(|e| RelError::Operational(format!("Pool error: {e}")))
        }

        /// Converts values to `tokio-postgres` parameters.
        fn to_sql_params(args: &[Value]) -> Vec<Box<dyn ToSql + Sync + Send>> {
            args.iter()
                .map(|v| -> Box<dyn ToSql + Sync + Send> {
                    match v {
                        Value::Null => Box::new(Option::<String>::None),
                        Value::Bool(b) => Box::new(*b),
                        Value::Int(i) => Box::new(*i),
                        Value::Float(f) => Box::new(*f),
                        Value::String(s) => Box::new(s.clone()),
                        Value::Bytes(b) => Box::new(b.clone()),
                        Value::Date(d) => Box::new(*d),
                        Value::DateTime(dt) => Box::new(*dt),
                        Value::DateTimeTz(dt) => Box::new(*dt),
                        Value::Time(t) => Box::new(*t),
                        Value::Uuid(u) => Box::new(*u),
                        Value::Json(j) => Box::new(j.clone()),
                    }
                })
                .collect()
        }

        fn convert_row(pg_row: &tokio_postgres::Row) -> Row {
            let columns: Vec<String> = pg_row
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();

            let values: Vec<Value> = pg_row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, col)| match *col.type_() {
                    Type::BOOL => pg_row
                        .try_get::<_, Option<bool>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Bool),
                    Type::INT2 => pg_row
                        .try_get::<_, Option<i16>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Int(i64::from(v))),
                    Type::INT4 => pg_row
                        .try_get::<_, Option<i32>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Int(i64::from(v))),
                    Type::INT8 => pg_row
                        .try_get::<_, Option<i64>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Int),
                    Type::FLOAT4 => pg_row
                        .try_get::<_, Option<f32>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Float(f64::from(v))),
                    Type::FLOAT8 => pg_row
                        .try_get::<_, Option<f64>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Float),
                    Type::BYTEA => pg_row
                        .try_get::<_, Option<Vec<u8>>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Bytes),
                    Type::UUID => pg_row
                        .try_get::<_, Option<uuid::Uuid>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Uuid),
                    Type::DATE => pg_row
                        .try_get::<_, Option<chrono::NaiveDate>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Date),
                    Type::TIMESTAMP => pg_row
                        .try_get::<_, Option<chrono::NaiveDateTime>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::DateTime),
                    Type::TIMESTAMPTZ => pg_row
                        .try_get::<_, Option<chrono::DateTime<chrono::FixedOffset>>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::DateTimeTz),
                    Type::TIME => pg_row
                        .try_get::<_, Option<chrono::NaiveTime>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Time),
                    Type::JSON | Type::JSONB => pg_row
                        .try_get::<_, Option<serde_json::Value>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Json),
                    _ => pg_row
                        .try_get::<_, Option<String>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::String),
                })
                .collect();

            Row::new(columns, values)
        }
    }

    fn db_error(e: &tokio_postgres::Error) -> RelError {
        // The server message carries the constraint name the classifier needs.
        match e.as_db_error() {
            Some(db) => RelError::Database(db.message().to_string()),
            None => RelError::Database(e.to_string()),
        }
    }

    #[async_trait::async_trait]
    impl Connection for PostgresConnection {
        async fn execute(&self, sql: &str, args: &[Value]) -> RelResult<ExecResult> {
            let client = self.client().await?;

            // ALTER TABLE compiles to one statement per definition, which the
            // extended protocol rejects.
            if args.is_empty() && sql.trim_end().trim_end_matches(';').contains(';') {
                client.batch_execute(sql).await.map_err(|e| db_error(&e))?;
                return Ok(ExecResult::default());
            }

            let params = Self::to_sql_params(args);
            let param_refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();

            let rows_affected = client
                .execute(sql, &param_refs)
                .await
                .map_err(|e| db_error(&e))?;

            Ok(ExecResult {
                last_insert_id: 0,
                rows_affected,
            })
        }

        async fn query(&self, sql: &str, args: &[Value]) -> RelResult<Vec<Row>> {
            let client = self.client().await?;
            let params = Self::to_sql_params(args);
            let param_refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();

            let rows = client
                .query(sql, &param_refs)
                .await
                .map_err(|e| db_error(&e))?;

            Ok(rows.iter().map(Self::convert_row).collect())
        }

        async fn begin(&self) -> RelResult<Arc<dyn Connection>> {
            let client = self.client().await?;
            client.batch_execute("BEGIN").await.map_err(|e| db_error(&e))?;
            Ok(Arc::new(Self {
                pool: self.pool.clone(),
                pinned: Some(client),
            }))
        }

        async fn commit(&self) -> RelResult<()> {
            let client = self.client().await?;
            client.batch_execute("COMMIT").await.map_err(|e| db_error(&e))
        }

        async fn rollback(&self) -> RelResult<()> {
            let client = self.client().await?;
            client.batch_execute("ROLLBACK").await.map_err(|e| db_error(&e))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rel_rs_db::builder::BufferFactory;

    // ── Quoting ──────────────────────────────────────────────────────

    #[test]
    fn test_quote_id() {
        let q = PostgresQuote;
        assert_eq!(q.id("todos"), "\"todos\"");
        assert_eq!(q.id("a\"b"), "\"a\"\"b\"");
        assert_eq!(q.id("abc\0def"), "\"abc\"");
    }

    #[test]
    fn test_quote_value() {
        let q = PostgresQuote;
        assert_eq!(q.value("it's"), "'it''s'");
        assert_eq!(q.value("a\\b"), " E'a\\\\b'");
    }

    // ── Time formatting ──────────────────────────────────────────────

    #[test]
    fn test_format_time_utc_and_fraction() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_nano_opt(3, 4, 5, 120_000_999)
            .unwrap();
        assert_eq!(format_time(&utc(&t)), "2024-01-02 03:04:05.12Z");
    }

    #[test]
    fn test_format_time_negative_offset() {
        let tz = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        let t = tz.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_time(&t), "2024-06-01 12:00:00-05:30:00");
    }

    #[test]
    fn test_inline_datetime_uses_timestamptz_text() {
        let factory = BufferFactory::new(PostgresQuote).value_converter(value_converter);
        let mut buf = factory.create_inline();
        let t = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        buf.write_value(&Value::DateTime(t));
        assert_eq!(buf.sql(), "'2024-01-02 03:04:05Z'");
    }

    // ── Column mapping ───────────────────────────────────────────────

    fn map(mut column: Column) -> (String, u32, u32, Column) {
        let (typ, m, n) = column_mapper(&mut column);
        (typ, m, n, column)
    }

    #[test]
    fn test_column_mapper() {
        assert_eq!(map(Column::new("id", ColumnType::Id)).0, "SERIAL NOT NULL");
        assert_eq!(map(Column::new("id", ColumnType::BigId)).0, "BIGSERIAL NOT NULL");
        assert_eq!(map(Column::new("data", ColumnType::Json)).0, "JSONB");
        assert_eq!(map(Column::new("at", ColumnType::DateTime)).0, "TIMESTAMPTZ");

        let mut c = Column::new("n", ColumnType::Int);
        c.limit(11).unsigned();
        let (typ, m, _, c) = map(c);
        assert_eq!((typ.as_str(), m), ("INT", 0));
        assert!(!c.unsigned);

        assert_eq!(map(Column::new("title", ColumnType::String)).1, 255);
    }

    #[test]
    fn test_column_mapper_defaults() {
        let mut c = Column::new("note", ColumnType::String);
        c.default("");
        assert_eq!(map(c).3.default, None);

        let mut c = Column::new("at", ColumnType::DateTime);
        c.default(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(map(c).3.default, Some(Value::from("2024-01-02 00:00:00Z")));
    }

    // ── Errors ───────────────────────────────────────────────────────

    #[test]
    fn test_error_mapper_unique() {
        let err = error_mapper(RelError::Database(
            "duplicate key value violates unique constraint \"todos_title_key\"".into(),
        ));
        let c = err.constraint().unwrap();
        assert_eq!(c.kind, ConstraintKind::Unique);
        assert_eq!(c.key, "todos_title_key");
    }

    #[test]
    fn test_error_mapper_foreign_key_and_check() {
        let err = error_mapper(RelError::Database(
            "insert or update on table \"todos\" violates foreign key constraint \"todos_user_id_fkey\"".into(),
        ));
        assert!(err.is_foreign_key_violation());
        let err = error_mapper(RelError::Database(
            "new row for relation \"todos\" violates check constraint \"order_positive\"".into(),
        ));
        assert!(err.is_check_violation());
    }

    #[test]
    fn test_error_mapper_passthrough() {
        let err = error_mapper(RelError::Database("syntax error".into()));
        assert!(matches!(err, RelError::Database(_)));
        let err = error_mapper(RelError::NotFound("x".into()));
        assert!(matches!(err, RelError::NotFound(_)));
    }
}
