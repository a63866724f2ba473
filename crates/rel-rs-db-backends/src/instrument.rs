//! The observability hook wrapped around every physical adapter operation.
//!
//! [`Instrumenter::observe`] is called before an exec, query, begin, commit
//! or rollback. The returned [`Finish`] is completed with the operation's
//! error, if any.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rel_rs_core::RelError;

type Observer = dyn Fn(&str, &str) -> Finish + Send + Sync;

/// Completion callback returned by [`Instrumenter::observe`].
pub struct Finish(Option<Box<dyn FnOnce(Option<&RelError>) + Send>>);

impl Finish {
    /// Wraps a completion closure.
    pub fn new(f: impl FnOnce(Option<&RelError>) + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A completion that does nothing.
    pub const fn noop() -> Self {
        Self(None)
    }

    /// Reports the outcome of the operation.
    pub fn done(self, err: Option<&RelError>) {
        if let Some(f) = self.0 {
            f(err);
        }
    }
}

impl fmt::Debug for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Finish").field(&self.0.is_some()).finish()
    }
}

/// Observes adapter operations.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use rel_rs_db_backends::{Finish, Instrumenter};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&seen);
/// let instrumenter = Instrumenter::custom(move |op, message| {
///     log.lock().unwrap().push(format!("{op}: {message}"));
///     Finish::noop()
/// });
///
/// instrumenter.observe("adapter-exec", "DELETE FROM \"todos\";").done(None);
/// assert_eq!(seen.lock().unwrap()[0], "adapter-exec: DELETE FROM \"todos\";");
/// ```
#[derive(Clone, Default)]
pub enum Instrumenter {
    /// Emits a `tracing` event with the elapsed time when each operation finishes.
    #[default]
    Tracing,
    /// Observes nothing.
    Noop,
    /// A caller-supplied observer.
    Custom(Arc<Observer>),
}

impl fmt::Debug for Instrumenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tracing => f.write_str("Tracing"),
            Self::Noop => f.write_str("Noop"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Instrumenter {
    /// Wraps a closure receiving `(op, message)`.
    pub fn custom(f: impl Fn(&str, &str) -> Finish + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// An instrumenter that observes nothing.
    pub const fn noop() -> Self {
        Self::Noop
    }

    /// Starts observing `op`.
    pub fn observe(&self, op: &str, message: &str) -> Finish {
        match self {
            Self::Noop => Finish::noop(),
            Self::Custom(f) => f(op, message),
            Self::Tracing => {
                let start = Instant::now();
                let op = op.to_string();
                let message = message.to_string();
                Finish::new(move |err| {
                    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                    match err {
                        Some(err) => tracing::warn!(op = %op, elapsed_ms, error = %err, "{message}"),
                        None => tracing::debug!(op = %op, elapsed_ms, "{message}"),
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_custom_receives_outcome() {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&outcomes);
        let instrumenter = Instrumenter::custom(move |op, _| {
            let log = Arc::clone(&log);
            let op = op.to_string();
            Finish::new(move |err| log.lock().unwrap().push((op, err.is_some())))
        });

        instrumenter.observe("adapter-begin", "begin").done(None);
        instrumenter
            .observe("adapter-exec", "x")
            .done(Some(&RelError::Database("boom".into())));

        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![("adapter-begin".to_string(), false), ("adapter-exec".to_string(), true)]
        );
    }

    #[test]
    fn test_tracing_and_noop_complete() {
        Instrumenter::default().observe("adapter-query", "SELECT 1;").done(None);
        Instrumenter::default()
            .observe("adapter-query", "SELECT 1;")
            .done(Some(&RelError::Database("x".into())));
        Instrumenter::noop().observe("adapter-query", "SELECT 1;").done(None);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Instrumenter::noop()), "Noop");
        assert_eq!(format!("{:?}", Finish::noop()), "Finish(false)");
    }
}
