//! Helpers shared by the dialects: the generic column type mapping and
//! error-message scraping.

use crate::schema::{Column, ColumnType};
use crate::value::Value;

/// Layout for DATE defaults.
pub const DATE_LAYOUT: &str = "%Y-%m-%d";
/// Layout for DATETIME defaults.
pub const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";
/// Layout for TIME defaults.
pub const TIME_LAYOUT: &str = "%H:%M:%S";

/// Maps a column to `(native type, first modifier, second modifier)`.
///
/// A zero modifier is not rendered. The mapper runs on a copy of the column
/// and may rewrite it, typically to normalize the default value.
///
/// This mapping matches MySQL and is the base the other dialects refine.
pub fn column_mapper(column: &mut Column) -> (String, u32, u32) {
    match &column.kind {
        ColumnType::Id => ("INT UNSIGNED AUTO_INCREMENT".into(), 0, 0),
        ColumnType::BigId => ("BIGINT UNSIGNED AUTO_INCREMENT".into(), 0, 0),
        ColumnType::Bool => ("BOOL".into(), 0, 0),
        ColumnType::Int => ("INT".into(), column.limit, 0),
        ColumnType::BigInt => ("BIGINT".into(), column.limit, 0),
        ColumnType::Float => ("FLOAT".into(), column.precision, 0),
        ColumnType::Decimal => ("DECIMAL".into(), column.precision, column.scale),
        ColumnType::String => {
            let limit = if column.limit == 0 { 255 } else { column.limit };
            ("VARCHAR".into(), limit, 0)
        }
        ColumnType::Text => ("TEXT".into(), column.limit, 0),
        ColumnType::Json => ("TEXT".into(), 0, 0),
        ColumnType::Date => {
            format_default(column, DATE_LAYOUT);
            ("DATE".into(), 0, 0)
        }
        ColumnType::DateTime => {
            format_default(column, DATE_TIME_LAYOUT);
            ("DATETIME".into(), 0, 0)
        }
        ColumnType::Time => {
            format_default(column, TIME_LAYOUT);
            ("TIME".into(), 0, 0)
        }
        ColumnType::Raw(raw) => (raw.clone(), 0, 0),
    }
}

/// Replaces a temporal default with its text form in `layout`.
fn format_default(column: &mut Column, layout: &str) {
    let formatted = match &column.default {
        Some(Value::Time(t)) => t.format(TIME_LAYOUT).to_string(),
        Some(Value::Date(d)) => d.and_time(chrono::NaiveTime::MIN).format(layout).to_string(),
        Some(Value::DateTime(dt)) => dt.format(layout).to_string(),
        Some(Value::DateTimeTz(dt)) => dt.format(layout).to_string(),
        _ => return,
    };
    column.default = Some(Value::String(formatted));
}

/// Returns the text between the first `left` and the last `right` in `s`.
///
/// An empty `right` extends to the end of `s`. When either marker is missing,
/// or nothing lies between them, `s` itself is returned.
///
/// # Examples
///
/// ```
/// use rel_rs_db::builder::extract_string;
///
/// let msg = r#"duplicate key value violates unique constraint "todos_title_key""#;
/// assert_eq!(extract_string(msg, "constraint \"", "\""), "todos_title_key");
/// assert_eq!(extract_string("no markers", "[", "]"), "no markers");
/// ```
pub fn extract_string<'a>(s: &'a str, left: &str, right: &str) -> &'a str {
    let Some(start) = s.find(left) else {
        return s;
    };
    let end = if right.is_empty() {
        Some(s.len())
    } else {
        s.rfind(right)
    };
    match end {
        Some(end) if start + left.len() < end => &s[start + left.len()..end],
        _ => s,
    }
}
