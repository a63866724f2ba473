//! Scalar values carried by the IR.
//!
//! A [`Value`] reaches SQL in one of two ways. DML builders bind it: the
//! statement gets a placeholder and the value is appended to the argument
//! list in placeholder order. DDL builders inline it: column defaults and
//! partial-index conditions are written as literals by [`Value::literal`],
//! after the dialect's [`ValueConverter`](crate::builder::ValueConverter) has
//! had a chance to rewrite it (PostgreSQL, for instance, reformats
//! timestamps with their offset).
//!
//! Adapters also produce values when they decode result rows.

use crate::builder::Quoter;

/// Layout for inlined `DateTime` and `DateTimeTz` literals.
pub const LITERAL_DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// A bindable scalar.
///
/// # Examples
///
/// ```
/// use rel_rs_db::value::Value;
///
/// assert_eq!(Value::from(42), Value::Int(42));
/// assert_eq!(Value::from(None::<&str>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `NULL`, bound or inlined.
    Null,
    /// Inlined with the dialect's boolean literals (`true`, or `1` on SQLite).
    Bool(bool),
    /// Every integer width widens to this.
    Int(i64),
    /// Every float width widens to this.
    Float(f64),
    /// Inlined as a quoted, escaped string literal.
    String(String),
    /// Binary data. Inlined only when it is valid UTF-8; otherwise lossily.
    Bytes(Vec<u8>),
    /// Inlined as `'YYYY-MM-DD'`.
    Date(chrono::NaiveDate),
    /// Inlined with [`LITERAL_DATE_TIME_LAYOUT`].
    DateTime(chrono::NaiveDateTime),
    /// A timestamp with its UTC offset. The offset is dropped when inlined
    /// unless a value converter formats it first.
    DateTimeTz(chrono::DateTime<chrono::FixedOffset>),
    /// Inlined as `'HH:MM:SS'`.
    Time(chrono::NaiveTime),
    /// Inlined in hyphenated form.
    Uuid(uuid::Uuid),
    /// Inlined as its compact JSON text.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders this value as a SQL literal.
    ///
    /// `booleans` holds the dialect's `(true, false)` literals.
    pub fn literal(&self, quoter: &dyn Quoter, booleans: (&str, &str)) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => booleans.0.to_string(),
            Self::Bool(false) => booleans.1.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => quoter.value(s),
            Self::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => quoter.value(s),
                Err(_) => {
                    tracing::warn!(len = b.len(), "non-UTF-8 bytes rendered lossily as inline literal");
                    quoter.value(&String::from_utf8_lossy(b))
                }
            },
            Self::Date(d) => quoter.value(&d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => quoter.value(&dt.format(LITERAL_DATE_TIME_LAYOUT).to_string()),
            Self::DateTimeTz(dt) => quoter.value(&dt.format(LITERAL_DATE_TIME_LAYOUT).to_string()),
            Self::Time(t) => quoter.value(&t.format("%H:%M:%S").to_string()),
            Self::Uuid(u) => quoter.value(&u.to_string()),
            Self::Json(j) => quoter.value(&j.to_string()),
        }
    }
}

macro_rules! value_from {
    ($($t:ty => |$v:ident| $e:expr),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $e
                }
            }
        )*
    };
}

value_from!(
    bool => |v| Self::Bool(v),
    i32 => |v| Self::Int(i64::from(v)),
    i64 => |v| Self::Int(v),
    u32 => |v| Self::Int(i64::from(v)),
    f32 => |v| Self::Float(f64::from(v)),
    f64 => |v| Self::Float(v),
    String => |v| Self::String(v),
    &str => |v| Self::String(v.to_string()),
    Vec<u8> => |v| Self::Bytes(v),
    chrono::NaiveDate => |v| Self::Date(v),
    chrono::NaiveDateTime => |v| Self::DateTime(v),
    chrono::DateTime<chrono::FixedOffset> => |v| Self::DateTimeTz(v),
    chrono::DateTime<chrono::Utc> => |v| Self::DateTimeTz(v.into()),
    chrono::NaiveTime => |v| Self::Time(v),
    uuid::Uuid => |v| Self::Uuid(v),
    serde_json::Value => |v| Self::Json(v),
);

/// `None` binds as `NULL`.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Quote;
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    fn ansi(value: &Value) -> String {
        value.literal(&Quote::ANSI, ("true", "false"))
    }

    // ── Conversions ──────────────────────────────────────────────────

    #[test]
    fn test_integer_and_float_widths_widen() {
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(u32::MAX), Value::Int(4_294_967_295));
        assert_eq!(Value::from(1.5_f32), Value::Float(1.5));
    }

    #[test]
    fn test_option_binds_null() {
        assert_eq!(Value::from(Some("a")), Value::from("a"));
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_utc_becomes_zero_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap();
        match Value::from(utc) {
            Value::DateTimeTz(dt) => assert_eq!(dt.offset().local_minus_utc(), 0),
            other => panic!("Expected DateTimeTz, got {other:?}"),
        }
    }

    // ── Literals ─────────────────────────────────────────────────────

    #[test]
    fn test_literal_scalars() {
        assert_eq!(ansi(&Value::Null), "NULL");
        assert_eq!(ansi(&Value::Int(-3)), "-3");
        assert_eq!(ansi(&Value::Float(0.25)), "0.25");
        assert_eq!(ansi(&Value::from("it's")), "'it''s'");
        assert_eq!(Value::Bool(true).literal(&Quote::ANSI, ("1", "0")), "1");
        assert_eq!(Value::Bool(false).literal(&Quote::ANSI, ("1", "0")), "0");
    }

    #[test]
    fn test_literal_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let dt = date.and_hms_opt(10, 0, 0).unwrap();
        let tz = FixedOffset::east_opt(3600)
            .unwrap()
            .from_local_datetime(&dt)
            .unwrap();
        assert_eq!(ansi(&Value::Date(date)), "'2024-03-01'");
        assert_eq!(ansi(&Value::DateTime(dt)), "'2024-03-01 10:00:00'");
        assert_eq!(ansi(&Value::DateTimeTz(tz)), "'2024-03-01 10:00:00'");
        assert_eq!(ansi(&Value::Time(dt.time())), "'10:00:00'");
    }

    #[test]
    fn test_literal_structured() {
        assert_eq!(
            ansi(&Value::Uuid(uuid::Uuid::nil())),
            "'00000000-0000-0000-0000-000000000000'"
        );
        assert_eq!(ansi(&Value::Json(serde_json::json!({"a": 1}))), "'{\"a\":1}'");
        assert_eq!(ansi(&Value::Bytes(b"abc".to_vec())), "'abc'");
        assert_eq!(ansi(&Value::Bytes(vec![0xff])), "'\u{fffd}'");
    }

    #[test]
    fn test_literal_uses_dialect_quoting() {
        assert_eq!(Value::from("it's").literal(&Quote::MYSQL, ("true", "false")), "'it\\'s'");
    }
}
