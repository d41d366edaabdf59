//! Core system foundations
//!
//! This module contains the ambient building blocks shared by the rest of the
//! crate: error handling, configuration, logging macros and small helpers.

pub mod error;
pub mod config;
pub mod logging;
pub mod utils;

// Re-export commonly used items
pub use error::{Error, GraphError, GraphResult, Result, SerializationError};
pub use config::{Config, GraphConfig, LoggingConfig, SerializerConfig};
pub use logging::init_logging;
