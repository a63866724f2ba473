//! Identifier and string-literal quoting.

use std::fmt;

/// Dialect quoting rules.
pub trait Quoter: Send + Sync + fmt::Debug {
    /// Quotes an identifier such as a table or column name.
    fn id(&self, name: &str) -> String;

    /// Quotes a string literal.
    fn value(&self, value: &str) -> String;
}

/// Quoting by prefix/suffix characters with a configurable escape for the
/// closing character. Covers the MySQL and SQLite rules.
///
/// # Examples
///
/// ```
/// use rel_rs_db::builder::{Quote, Quoter};
///
/// let q = Quote::ANSI;
/// assert_eq!(q.id(r#"a"b"#), r#""a""b""#);
/// assert_eq!(q.value("it's"), "'it''s'");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Written before an identifier.
    pub id_prefix: &'static str,
    /// Written after an identifier.
    pub id_suffix: &'static str,
    /// Written before every `id_suffix` occurring inside an identifier.
    pub id_suffix_escape: &'static str,
    /// Wraps string literals.
    pub value_quote: &'static str,
    /// Written before every `value_quote` occurring inside a literal.
    pub value_quote_escape: &'static str,
}

impl Quote {
    /// Standard SQL: `"id"` and `'value'`, both escaped by doubling.
    pub const ANSI: Self = Self {
        id_prefix: "\"",
        id_suffix: "\"",
        id_suffix_escape: "\"",
        value_quote: "'",
        value_quote_escape: "'",
    };

    /// MySQL: `` `id` `` and `'value'` with backslash escapes.
    pub const MYSQL: Self = Self {
        id_prefix: "`",
        id_suffix: "`",
        id_suffix_escape: "`",
        value_quote: "'",
        value_quote_escape: "\\",
    };
}

impl Quoter for Quote {
    fn id(&self, name: &str) -> String {
        let escaped = name.replace(
            self.id_suffix,
            &format!("{}{}", self.id_suffix_escape, self.id_suffix),
        );
        format!("{}{escaped}{}", self.id_prefix, self.id_suffix)
    }

    fn value(&self, value: &str) -> String {
        let escaped = value.replace(
            self.value_quote,
            &format!("{}{}", self.value_quote_escape, self.value_quote),
        );
        format!("{}{escaped}{}", self.value_quote, self.value_quote)
    }
}
