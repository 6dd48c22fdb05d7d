//! Core error types for relmap.
//!
//! This module provides [`RelmapError`], the single error enum shared by every
//! crate in the workspace. It separates programmer/configuration errors
//! (a malformed join tree, a row schema that disagrees with the generated
//! column list) from runtime failures reported by query executors.

use thiserror::Error;

/// The primary error type for relmap.
///
/// Configuration and schema errors are fatal: the join tree or the column list
/// must be fixed before the operation can succeed. Nothing in relmap retries.
#[derive(Error, Debug)]
pub enum RelmapError {
    // ── Configuration ────────────────────────────────────────────────

    /// A join specification or a settings value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Hydration ────────────────────────────────────────────────────

    /// A result row does not carry the columns the join tree expects.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    // ── Database ─────────────────────────────────────────────────────

    /// A generic database error (value conversion, statement failure).
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred while rendering hydrated records.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RelmapError {
    /// Returns `true` for errors caused by a programming or configuration
    /// mistake rather than by the environment.
    ///
    /// - `ConfigurationError`, `SchemaMismatch` -> fatal
    /// - everything else -> not fatal
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigurationError(_) | Self::SchemaMismatch(_))
    }
}

/// A convenience type alias for `Result<T, RelmapError>`.
pub type RelmapResult<T> = Result<T, RelmapError>;
