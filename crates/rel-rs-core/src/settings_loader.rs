//! Loads [`Settings`] from a TOML file and `REL_*` environment variables.
//!
//! Keys missing from the file keep their defaults, and environment
//! variables win over the file:
//!
//! | Variable | Setting |
//! |---|---|
//! | `REL_DEBUG` | `debug` |
//! | `REL_LOG_LEVEL` | `log_level` |
//! | `REL_DATABASE_ENGINE` | `database.engine` |
//! | `REL_DATABASE_URL` | `database.url` |
//! | `REL_DATABASE_MAX_CONNECTIONS` | `database.max_connections` |
//! | `REL_DATABASE_STATEMENT_TIMEOUT_MS` | `database.statement_timeout_ms` |
//!
//! ```rust,no_run
//! use rel_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/rel.toml").unwrap();
//! println!("connecting to {}", settings.database.url);
//! ```

use std::path::Path;
use std::str::FromStr;

use crate::error::{RelError, RelResult};
use crate::settings::Settings;

/// Parses settings from TOML text.
///
/// # Errors
///
/// Returns [`RelError::Configuration`] for malformed TOML or a mistyped key.
pub fn from_toml_str(toml_str: &str) -> RelResult<Settings> {
    toml::from_str(toml_str)
        .map_err(|e| RelError::Configuration(format!("invalid settings: {e}")))
}

/// Reads and parses a settings file.
///
/// # Errors
///
/// Returns [`RelError::Configuration`] if the file cannot be read or parsed.
pub fn from_toml_file(path: impl AsRef<Path>) -> RelResult<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        RelError::Configuration(format!("cannot read settings file {}: {e}", path.display()))
    })?;
    from_toml_str(&content)
}

/// Reads a settings file, then applies the `REL_*` variables of the process.
///
/// # Errors
///
/// See [`from_toml_file`] and [`apply_env_overrides`].
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> RelResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// Defaults overridden by the `REL_*` variables of the process.
///
/// # Errors
///
/// See [`apply_env_overrides`].
pub fn from_env() -> RelResult<Settings> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// Applies `REL_*` overrides read through `lookup`.
///
/// `REL_DEBUG` accepts `true`/`1`/`yes` and `false`/`0`/`no`.
///
/// # Errors
///
/// Returns [`RelError::Configuration`] naming the variable when a value
/// cannot be parsed.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> RelResult<()> {
    if let Some(value) = lookup("REL_DEBUG") {
        settings.debug = match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(invalid("REL_DEBUG", &value)),
        };
    }
    if let Some(value) = lookup("REL_LOG_LEVEL") {
        settings.log_level = value;
    }

    let database = &mut settings.database;
    if let Some(value) = lookup("REL_DATABASE_ENGINE") {
        database.engine = value;
    }
    if let Some(value) = lookup("REL_DATABASE_URL") {
        database.url = value;
    }
    if let Some(value) = lookup("REL_DATABASE_MAX_CONNECTIONS") {
        database.max_connections = parse_number("REL_DATABASE_MAX_CONNECTIONS", &value)?;
    }
    if let Some(value) = lookup("REL_DATABASE_STATEMENT_TIMEOUT_MS") {
        database.statement_timeout_ms =
            parse_number("REL_DATABASE_STATEMENT_TIMEOUT_MS", &value)?;
    }
    Ok(())
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> RelResult<T> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

fn invalid(name: &str, value: &str) -> RelError {
    RelError::Configuration(format!("{name}: invalid value {value:?}"))
}
