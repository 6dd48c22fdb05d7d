//! Settings for relmap.
//!
//! This module provides the [`Settings`] struct, which holds logging
//! configuration and the [`MapperSettings`] shared by the clause builder and
//! the hydrator, plus [`LazySettings`], a globally-accessible, lazily-initialized
//! settings instance.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The default separator between a table alias and a field name in
/// generated column aliases (`posts_T_title`).
pub const DEFAULT_COLUMN_SEPARATOR: &str = "_T_";

/// The default attribute name under which child records are nested.
pub const DEFAULT_JOINT_DATA_KEY: &str = "joint_data";

/// Join mapping configuration.
///
/// The clause builder and the hydrator must agree on `column_separator`;
/// keeping both in one struct makes that the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperSettings {
    /// Separator placed between alias and field in generated column aliases.
    pub column_separator: String,
    /// Record attribute under which child records are nested.
    pub joint_data_key: String,
    /// Whether the hydrator falls back to a bare `field` column when the
    /// qualified `alias{sep}field` column is absent from a row. Field names
    /// selected by more than one node of the tree are never read bare.
    pub accept_unqualified_columns: bool,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            column_separator: DEFAULT_COLUMN_SEPARATOR.to_string(),
            joint_data_key: DEFAULT_JOINT_DATA_KEY.to_string(),
            accept_unqualified_columns: true,
        }
    }
}

/// The complete set of relmap settings.
///
/// # Examples
///
/// ```
/// use relmap_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.mapper.column_separator, "_T_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty log output).
    pub debug: bool,
    /// The log level (e.g. "info", "debug", "relmap_db=trace").
    pub log_level: String,
    /// Join mapping configuration.
    pub mapper: MapperSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            mapper: MapperSettings::default(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
///
/// # Panics
///
/// [`get`](LazySettings::get) panics if settings have not been configured.
/// [`configure`](LazySettings::configure) panics if called more than once.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, if any.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
