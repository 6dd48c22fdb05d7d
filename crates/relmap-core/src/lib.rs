//! # relmap-core
//!
//! Core error types, settings, and logging for relmap.
//! This crate has no relmap dependencies and provides the foundation for the
//! other crates in the workspace.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{RelmapError, RelmapResult};
pub use settings::{MapperSettings, Settings, SETTINGS};
