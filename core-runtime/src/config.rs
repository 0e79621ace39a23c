//! # Core Configuration Module
//!
//! Configuration management for the catalog search service.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! and validates it fail-fast, so that a misconfigured process stops at
//! startup instead of on its first search.
//!
//! ## Settings
//!
//! - `database_path` (required): SQLite catalog file
//! - `max_results_per_search`: cap applied to anime, song-name and ANN id
//!   searches (unbounded when unset)
//! - `artist_lookup_limit`: how many artists a name query may resolve to
//!   (default 50)
//! - `logging`: see [`LoggingConfig`]
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/srv/catalog/songs.db")
//!     .max_results_per_search(300)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.artist_lookup_limit, 50);
//! ```
//!
//! Or from the process environment:
//!
//! ```ignore
//! let config = CoreConfig::from_env()?;
//! ```

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;

pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
pub const ENV_MAX_RESULTS_PER_SEARCH: &str = "MAX_RESULTS_PER_SEARCH";
pub const ENV_ARTIST_LOOKUP_LIMIT: &str = "ARTIST_LOOKUP_LIMIT";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

pub const DEFAULT_ARTIST_LOOKUP_LIMIT: usize = 50;

/// Core configuration for the catalog search service.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Path to the SQLite catalog
    pub database_path: PathBuf,

    /// Maximum number of songs returned by anime, song-name and ANN id searches
    pub max_results_per_search: Option<usize>,

    /// Maximum number of artists a name query resolves to
    pub artist_lookup_limit: usize,

    pub logging: LoggingConfig,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Reads the configuration from the process environment.
    ///
    /// `DATABASE_PATH` is required; `MAX_RESULTS_PER_SEARCH`,
    /// `ARTIST_LOOKUP_LIMIT`, `LOG_LEVEL` and `LOG_FORMAT` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = CoreConfig::builder();
        if let Some(path) = read(ENV_DATABASE_PATH) {
            builder = builder.database_path(path);
        }
        if let Some(value) = read(ENV_MAX_RESULTS_PER_SEARCH) {
            builder = builder.max_results_per_search(parse_count(ENV_MAX_RESULTS_PER_SEARCH, &value)?);
        }
        if let Some(value) = read(ENV_ARTIST_LOOKUP_LIMIT) {
            builder = builder.artist_lookup_limit(parse_count(ENV_ARTIST_LOOKUP_LIMIT, &value)?);
        }

        let mut logging = LoggingConfig::default();
        if let Some(value) = read(ENV_LOG_LEVEL) {
            logging = logging.with_level(value.parse()?);
        }
        if let Some(value) = read(ENV_LOG_FORMAT) {
            logging = logging.with_format(value.parse()?);
        }

        builder.logging(logging).build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Result caps are greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.max_results_per_search == Some(0) {
            return Err(Error::Config(
                "Max results per search must be greater than 0".to_string(),
            ));
        }

        if self.artist_lookup_limit == 0 {
            return Err(Error::Config(
                "Artist lookup limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a positive integer, got {value:?}")))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    max_results_per_search: Option<usize>,
    artist_lookup_limit: Option<usize>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the catalog database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn max_results_per_search(mut self, max: usize) -> Self {
        self.max_results_per_search = Some(max);
        self
    }

    /// Default: 50
    pub fn artist_lookup_limit(mut self, limit: usize) -> Self {
        self.artist_lookup_limit = Some(limit);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the database path is missing or a
    /// limit is zero.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config(format!(
                "Database path is required. Set it on the builder or through {ENV_DATABASE_PATH}."
            ))
        })?;

        let config = CoreConfig {
            database_path,
            max_results_per_search: self.max_results_per_search,
            artist_lookup_limit: self
                .artist_lookup_limit
                .unwrap_or(DEFAULT_ARTIST_LOOKUP_LIMIT),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
