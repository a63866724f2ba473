//! Result rows and backend identification.
//!
//! [`Row`] is what a backend connection hands back from a query: column names
//! plus their [`Value`]s, with typed access through [`FromValue`].

use std::fmt;

use rel_rs_core::RelError;

use crate::value::Value;

/// The SQL dialect family a compiled statement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    PostgreSQL,
    /// SQLite (uses `?` placeholders).
    SQLite,
    /// MySQL (uses `?` placeholders).
    MySQL,
}

impl DatabaseBackendType {
    /// Maps a configured engine name to a backend.
    ///
    /// # Examples
    ///
    /// ```
    /// use rel_rs_db::DatabaseBackendType;
    ///
    /// assert_eq!(
    ///     DatabaseBackendType::from_engine("postgres").unwrap(),
    ///     DatabaseBackendType::PostgreSQL
    /// );
    /// assert!(DatabaseBackendType::from_engine("oracle").is_err());
    /// ```
    pub fn from_engine(engine: &str) -> Result<Self, RelError> {
        match engine.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            other => Err(RelError::Configuration(format!(
                "Unknown database engine '{other}'"
            ))),
        }
    }

    /// Returns the canonical engine name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgres",
            Self::SQLite => "sqlite",
            Self::MySQL => "mysql",
        }
    }
}

impl fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A generic database row for passing data between backends and callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, RelError> {
        let value = self.get_value(column).ok_or_else(|| {
            RelError::Database(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Gets a typed value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or the value cannot be
    /// converted to the requested type.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> Result<T, RelError> {
        let value = self.values.get(idx).ok_or_else(|| {
            RelError::Database(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw Value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, RelError>;
}

fn mismatch(expected: &str, value: &Value) -> RelError {
    RelError::Database(format!("Expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::Int(i) => Ok(*i),
            // Some drivers report integer variables and aggregates as text.
            Value::String(s) => s.trim().parse().map_err(|_| mismatch("Int", value)),
            _ => Err(mismatch("Int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        let i = i64::from_value(value)?;
        Self::try_from(i)
            .map_err(|e| RelError::Database(format!("Int value out of i32 range: {e}")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as Self),
            _ => Err(mismatch("Float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(mismatch("Bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::Uuid(u) => Ok(*u),
            _ => Err(mismatch("Uuid", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, RelError> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo_row() -> Row {
        Row::new(
            vec!["id".into(), "title".into(), "completed".into(), "order".into()],
            vec![
                Value::Int(1),
                Value::from("Sleep"),
                Value::Bool(false),
                Value::Null,
            ],
        )
    }

    // ── Row access ───────────────────────────────────────────────────

    #[test]
    fn test_row_get_typed() {
        let row = todo_row();
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<i32>("id").unwrap(), 1);
        assert_eq!(row.get::<String>("title").unwrap(), "Sleep");
        assert!(!row.get::<bool>("completed").unwrap());
        assert_eq!(row.get::<Option<i64>>("order").unwrap(), None);
        assert_eq!(row.len(), 4);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_get_missing_column() {
        let row = todo_row();
        let err = row.get::<i64>("missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_row_get_by_index() {
        let row = todo_row();
        assert_eq!(row.get_by_index::<String>(1).unwrap(), "Sleep");
        assert!(row.get_by_index::<i64>(10).is_err());
    }

    #[test]
    fn test_row_type_mismatch() {
        let row = todo_row();
        assert!(row.get::<i64>("title").is_err());
    }

    #[test]
    #[should_panic(expected = "Row column count must match value count")]
    fn test_row_new_mismatched_lengths() {
        let _ = Row::new(vec!["a".into()], vec![]);
    }

    // ── FromValue ────────────────────────────────────────────────────

    #[test]
    fn test_i64_from_text() {
        assert_eq!(i64::from_value(&Value::from(" 2 ")).unwrap(), 2);
        assert!(i64::from_value(&Value::from("two")).is_err());
    }

    #[test]
    fn test_f64_from_int() {
        let f = f64::from_value(&Value::Int(3)).unwrap();
        assert!((f - 3.0).abs() < f64::EPSILON);
    }

    // ── DatabaseBackendType ──────────────────────────────────────────

    #[test]
    fn test_from_engine_aliases() {
        assert_eq!(
            DatabaseBackendType::from_engine("PostgreSQL").unwrap(),
            DatabaseBackendType::PostgreSQL
        );
        assert_eq!(
            DatabaseBackendType::from_engine("mariadb").unwrap(),
            DatabaseBackendType::MySQL
        );
        assert_eq!(
            DatabaseBackendType::from_engine("sqlite3").unwrap(),
            DatabaseBackendType::SQLite
        );
    }

    #[test]
    fn test_from_engine_unknown() {
        let err = DatabaseBackendType::from_engine("oracle").unwrap_err();
        assert!(matches!(err, RelError::Configuration(_)));
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(DatabaseBackendType::MySQL.to_string(), "mysql");
    }
}
