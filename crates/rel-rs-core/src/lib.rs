//! # rel-rs-core
//!
//! Core types for the rel-rs workspace: the error taxonomy shared by the
//! compiler and the adapters, settings loading, and tracing setup. This crate
//! has no dependency on the other rel-rs crates.
//!
//! ## Modules
//!
//! - [`error`] - [`RelError`], constraint classification types, and result alias
//! - [`settings`] - Workspace settings with sensible defaults
//! - [`settings_loader`] - TOML and environment variable loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{ConstraintError, ConstraintKind, RelError, RelResult};
pub use settings::{DatabaseSettings, Settings};
