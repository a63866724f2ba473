//! Settings for rel-rs.
//!
//! [`Settings`] holds the few knobs the adapters need: logging and the
//! database connection. Every field has a default, so a partial TOML file or
//! an empty environment still yields a usable configuration.

use serde::{Deserialize, Serialize};

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The dialect name: `postgres`, `mysql` or `sqlite`.
    pub engine: String,
    /// The connection URL passed to the driver.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: usize,
    /// Per-statement timeout in milliseconds. `0` disables the timeout.
    pub statement_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "postgres".to_string(),
            url: "postgres://localhost/rel".to_string(),
            max_connections: 16,
            statement_timeout_ms: 0,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug mode. Switches logging to the pretty formatter.
    pub debug: bool,
    /// Tracing filter directive.
    pub log_level: String,
    /// Database settings.
    pub database: DatabaseSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            database: DatabaseSettings::default(),
        }
    }
}
