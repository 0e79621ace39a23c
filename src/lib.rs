//! Anime song catalog search.
//!
//! Umbrella crate re-exporting the search façade and runtime setup. Hosts
//! typically:
//!
//! ```rust,ignore
//! let config = CoreConfig::from_env()?;
//! init_logging(config.logging.clone())?;
//! let service = SearchService::bootstrap(&config).await?;
//! ```
//!
//! The matching engine lives in `core-artists` and the SQLite catalog in
//! `core-library`; both are reachable through `core-service`.

pub use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use core_service::*;
