//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the catalog search crates:
//! - Logging and tracing setup
//! - Configuration loading and validation
//!
//! ## Overview
//!
//! Hosts build a [`config::CoreConfig`] (programmatically or from the
//! process environment), call [`logging::init_logging`] once, and hand the
//! configuration to the search service.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
