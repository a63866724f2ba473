//! The SQL text accumulator shared by every statement builder.
//!
//! A [`Buffer`] collects SQL text and the ordered argument list bound to its
//! placeholders. It is configured by a [`BufferFactory`], which every builder
//! of a dialect shares so that they agree on placeholders, quoting and the
//! identifier-escape cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::quote::Quoter;
use crate::value::Value;

/// Identifiers starting with this character are written without escaping.
pub const UNESCAPE_CHARACTER: char = '^';

/// Rewrites a value before it is rendered as an inline literal.
pub type ValueConverter = fn(&Value) -> Value;

/// How positional parameters are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `?` for every parameter.
    Question,
    /// `$1`, `$2`, ... numbered per statement.
    Ordinal,
}

/// Memoized identifier escapes, keyed by `(table, value)`.
///
/// Owned by a dialect's [`BufferFactory`] so dialects with different quoting
/// never share entries.
#[derive(Debug, Clone, Default)]
pub struct EscapeCache {
    entries: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl EscapeCache {
    fn get(&self, table: &str, value: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&(table.to_string(), value.to_string()))
            .cloned()
    }

    fn insert(&self, table: &str, value: &str, escaped: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((table.to_string(), value.to_string()), escaped.to_string());
        }
    }

    /// Number of cached escapes.
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    /// Returns `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-dialect buffer configuration.
#[derive(Clone)]
pub struct BufferFactory {
    /// Identifier and literal quoting.
    pub quoter: Arc<dyn Quoter>,
    /// Parameter style.
    pub placeholder: Placeholder,
    /// Inline literal for `true`.
    pub bool_true: &'static str,
    /// Inline literal for `false`.
    pub bool_false: &'static str,
    /// Applied to values before inline rendering.
    pub value_converter: Option<ValueConverter>,
    /// Render values as literals instead of placeholders.
    pub inline_values: bool,
    /// Shared identifier-escape cache.
    pub escape_cache: EscapeCache,
}

impl fmt::Debug for BufferFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferFactory")
            .field("quoter", &self.quoter)
            .field("placeholder", &self.placeholder)
            .field("bool_true", &self.bool_true)
            .field("bool_false", &self.bool_false)
            .field("inline_values", &self.inline_values)
            .finish_non_exhaustive()
    }
}

impl BufferFactory {
    /// A factory with `?` placeholders and `true`/`false` literals.
    pub fn new(quoter: impl Quoter + 'static) -> Self {
        Self::with_quoter(Arc::new(quoter))
    }

    /// Like [`BufferFactory::new`] for an already shared quoter.
    pub fn with_quoter(quoter: Arc<dyn Quoter>) -> Self {
        Self {
            quoter,
            placeholder: Placeholder::Question,
            bool_true: "true",
            bool_false: "false",
            value_converter: None,
            inline_values: false,
            escape_cache: EscapeCache::default(),
        }
    }

    /// Sets the parameter style.
    #[must_use]
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Sets the inline boolean literals.
    #[must_use]
    pub fn bool_literals(mut self, bool_true: &'static str, bool_false: &'static str) -> Self {
        self.bool_true = bool_true;
        self.bool_false = bool_false;
        self
    }

    /// Sets the inline value converter.
    #[must_use]
    pub fn value_converter(mut self, converter: ValueConverter) -> Self {
        self.value_converter = Some(converter);
        self
    }

    /// Creates a parameterized buffer.
    pub fn create(&self) -> Buffer {
        Buffer::new(self.clone())
    }

    /// Creates a buffer that renders values as literals (used for DDL).
    pub fn create_inline(&self) -> Buffer {
        let mut config = self.clone();
        config.inline_values = true;
        Buffer::new(config)
    }
}

/// SQL text under construction plus its bound arguments.
#[derive(Debug, Clone)]
pub struct Buffer {
    sql: String,
    arguments: Vec<Value>,
    value_count: usize,
    config: BufferFactory,
}

impl Buffer {
    fn new(config: BufferFactory) -> Self {
        Self {
            sql: String::new(),
            arguments: Vec::new(),
            value_count: 0,
            config,
        }
    }

    /// The SQL written so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The arguments bound so far.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Returns `true` if no SQL has been written.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Consumes the buffer, returning the statement and its arguments.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.arguments)
    }

    /// Clears text, arguments and the placeholder counter.
    pub fn reset(&mut self) {
        self.sql.clear();
        self.arguments.clear();
        self.value_count = 0;
    }

    /// Appends raw text.
    pub fn write_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Appends a single character.
    pub fn write_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Writes the next placeholder.
    pub fn write_placeholder(&mut self) {
        self.value_count += 1;
        match self.config.placeholder {
            Placeholder::Question => self.sql.push('?'),
            Placeholder::Ordinal => {
                self.sql.push('$');
                self.sql.push_str(&self.value_count.to_string());
            }
        }
    }

    /// Appends arguments for placeholders already present in raw SQL.
    ///
    /// The placeholder counter advances past them, so a raw fragment bound
    /// to `$1` is followed by `$2`.
    pub fn add_arguments(&mut self, args: impl IntoIterator<Item = Value>) {
        let before = self.arguments.len();
        self.arguments.extend(args);
        self.value_count += self.arguments.len() - before;
    }

    /// Writes a value: a placeholder plus argument, or an inline literal.
    pub fn write_value(&mut self, value: &Value) {
        if !self.config.inline_values {
            self.write_placeholder();
            self.arguments.push(value.clone());
            return;
        }

        let converted;
        let value = match self.config.value_converter {
            Some(convert) => {
                converted = convert(value);
                &converted
            }
            None => value,
        };
        let literal = value.literal(
            self.config.quoter.as_ref(),
            (self.config.bool_true, self.config.bool_false),
        );
        self.sql.push_str(&literal);
    }

    /// Writes `field` escaped and qualified with `table`.
    pub fn write_field(&mut self, table: &str, field: &str) {
        let escaped = self.escape(table, field);
        self.sql.push_str(&escaped);
    }

    /// Writes an escaped identifier expression.
    pub fn write_escape(&mut self, value: &str) {
        self.write_field("", value);
    }

    /// Escapes an identifier expression.
    ///
    /// Handles `*`, a leading [`UNESCAPE_CHARACTER`], numeric literals,
    /// `expr AS alias`, a single function call such as `COUNT(id)`, and
    /// dotted names. Single-part names are qualified with `table` when it is
    /// non-empty.
    pub fn escape(&self, table: &str, value: &str) -> String {
        if value == "*" {
            if table.is_empty() {
                return "*".to_string();
            }
            return format!("{}.*", self.config.quoter.id(table));
        }

        let cache = &self.config.escape_cache;
        if let Some(hit) = cache.get(table, value) {
            return hit;
        }

        let escaped = self.escape_uncached(table, value);
        cache.insert(table, value, &escaped);
        escaped
    }

    fn escape_uncached(&self, table: &str, value: &str) -> String {
        if let Some(raw) = value.strip_prefix(UNESCAPE_CHARACTER) {
            return raw.to_string();
        }

        if value.parse::<i64>().is_ok() {
            return value.to_string();
        }

        // ASCII lowercasing keeps byte offsets valid for `value`.
        if let Some(i) = value.to_ascii_lowercase().find(" as ") {
            return format!(
                "{} AS {}",
                self.escape(table, &value[..i]),
                self.escape("", &value[i + 4..])
            );
        }

        if let (Some(start), Some(end)) = (value.find('('), value.find(')')) {
            if end > start {
                return format!(
                    "{}{}{}",
                    &value[..=start],
                    self.escape(table, &value[start + 1..end]),
                    &value[end..]
                );
            }
        }

        let mut parts: Vec<&str> = value.split('.').collect();
        if parts.len() == 1 && !table.is_empty() {
            parts.insert(0, table);
        }
        let last = parts.len() - 1;
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let part = part.trim();
                if i == last && part == "*" {
                    part.to_string()
                } else {
                    self.config.quoter.id(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::quote::Quote;
    use chrono::NaiveDate;

    fn factory() -> BufferFactory {
        BufferFactory::new(Quote::ANSI)
    }

    // ── Placeholders ─────────────────────────────────────────────────

    #[test]
    fn test_question_placeholders() {
        let mut buf = factory().create();
        buf.write_value(&Value::Int(1));
        buf.write_str(", ");
        buf.write_value(&Value::from("a"));
        let (sql, args) = buf.into_parts();
        assert_eq!(sql, "?, ?");
        assert_eq!(args, vec![Value::Int(1), Value::from("a")]);
    }

    #[test]
    fn test_ordinal_placeholders() {
        let mut buf = factory().placeholder(Placeholder::Ordinal).create();
        buf.write_placeholder();
        buf.write_char(',');
        buf.write_placeholder();
        assert_eq!(buf.sql(), "$1,$2");
        buf.reset();
        buf.write_placeholder();
        assert_eq!(buf.sql(), "$1");
    }

    #[test]
    fn test_add_arguments_advances_ordinal() {
        let mut buf = factory().placeholder(Placeholder::Ordinal).create();
        buf.write_str("x = $1 AND y = $2 AND z = ");
        buf.add_arguments([Value::Int(1), Value::Int(2)]);
        buf.write_value(&Value::Int(3));
        let (sql, args) = buf.into_parts();
        assert_eq!(sql, "x = $1 AND y = $2 AND z = $3");
        assert_eq!(args.len(), 3);
    }

    // ── Inline literals ──────────────────────────────────────────────

    #[test]
    fn test_inline_literals() {
        let mut buf = factory().bool_literals("1", "0").create_inline();
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Int(-3),
            Value::Float(1.5),
            Value::from("it's"),
        ] {
            buf.write_value(&v);
            buf.write_char(' ');
        }
        assert_eq!(buf.sql(), "NULL 1 -3 1.5 'it''s' ");
        assert!(buf.arguments().is_empty());
    }

    #[test]
    fn test_inline_datetime_uses_default_layout() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let mut buf = factory().create_inline();
        buf.write_value(&Value::DateTime(dt));
        assert_eq!(buf.sql(), "'2024-01-02 03:04:05'");
    }

    #[test]
    fn test_inline_value_converter() {
        fn shout(v: &Value) -> Value {
            match v {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other.clone(),
            }
        }
        let mut buf = factory().value_converter(shout).create_inline();
        buf.write_value(&Value::from("abc"));
        assert_eq!(buf.sql(), "'ABC'");
    }

    // ── Escaping ─────────────────────────────────────────────────────

    #[test]
    fn test_escape_star() {
        let buf = factory().create();
        assert_eq!(buf.escape("", "*"), "*");
        assert_eq!(buf.escape("todos", "*"), "\"todos\".*");
    }

    #[test]
    fn test_escape_plain_and_qualified() {
        let buf = factory().create();
        assert_eq!(buf.escape("", "title"), "\"title\"");
        assert_eq!(buf.escape("todos", "title"), "\"todos\".\"title\"");
        assert_eq!(buf.escape("todos", "users.name"), "\"users\".\"name\"");
        assert_eq!(buf.escape("", "users.*"), "\"users\".*");
        assert_eq!(buf.escape("", " users . name "), "\"users\".\"name\"");
    }

    #[test]
    fn test_escape_unescaped_and_numeric() {
        let buf = factory().create();
        assert_eq!(buf.escape("todos", "^COUNT(*) AS n"), "COUNT(*) AS n");
        assert_eq!(buf.escape("", "1"), "1");
    }

    #[test]
    fn test_escape_alias_and_function() {
        let buf = factory().create();
        assert_eq!(buf.escape("", "id As key"), "\"id\" AS \"key\"");
        assert_eq!(buf.escape("", "count(id)"), "count(\"id\")");
        assert_eq!(buf.escape("", "count(*) as total"), "count(*) AS \"total\"");
        assert_eq!(buf.escape("todos", "max(id)"), "max(\"todos\".\"id\")");
    }

    #[test]
    fn test_escape_is_cached_per_factory() {
        let f = factory();
        let buf = f.create();
        assert!(f.escape_cache.is_empty());
        buf.escape("", "title");
        buf.escape("", "title");
        assert_eq!(f.escape_cache.len(), 1);

        let other = factory();
        assert!(other.escape_cache.is_empty());
    }

    #[test]
    fn test_escape_cold_and_warm_cache_agree() {
        let inputs = [
            ("", "title"),
            ("todos", "title"),
            ("todos", "users.name"),
            ("", "id As key"),
            ("todos", "max(id)"),
            ("", "count(*) as total"),
            ("todos", "^COUNT(*)"),
            ("", "42"),
            ("todos", "*"),
        ];
        for quote in [Quote::ANSI, Quote::MYSQL] {
            let warm = BufferFactory::new(quote).create();
            for (table, value) in inputs {
                warm.escape(table, value);
            }
            for (table, value) in inputs {
                let cold = BufferFactory::new(quote).create().escape(table, value);
                assert_eq!(warm.escape(table, value), cold, "{quote:?} {table:?} {value:?}");
            }
        }
    }

    #[test]
    fn test_escape_cache_is_not_shared_between_quotings() {
        let ansi = BufferFactory::new(Quote::ANSI);
        let mysql = BufferFactory::new(Quote::MYSQL);
        assert_eq!(ansi.create().escape("", "title"), "\"title\"");
        assert_eq!(mysql.create().escape("", "title"), "`title`");
        assert_eq!(ansi.create().escape("", "title"), "\"title\"");
    }
}
