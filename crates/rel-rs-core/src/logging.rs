//! Logging integration for rel-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-statement spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info", "warn",
/// "error", or a full directive such as `rel_rs_db_backends=debug`). In debug
/// mode a pretty, human-readable format is used; otherwise a structured JSON
/// format is used.
///
/// Installing a subscriber twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one physical adapter operation.
///
/// `op` is the instrumentation tag, e.g. `adapter-query` or `adapter-begin`.
///
/// # Examples
///
/// ```
/// use rel_rs_core::logging::statement_span;
///
/// let span = statement_span("adapter-exec");
/// let _guard = span.enter();
/// tracing::debug!("executing");
/// ```
pub fn statement_span(op: &str) -> tracing::Span {
    tracing::debug_span!("statement", op = op)
}
