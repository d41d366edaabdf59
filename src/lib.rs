//! Field Graph - A reflective object model with JSON persistence
//!
//! Field Graph stores application objects in an [`ObjectGraph`]. Every object
//! belongs to a class that declares named, typed fields: data values, owned
//! children and non-owning pointers. The graph tracks ownership and pointer
//! links so deleting an object leaves no dangling references, and the
//! [`JsonSerializer`] writes and reads whole trees, resolving pointers
//! through textual reference paths.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod types;

// Main functional modules
pub mod graph;
pub mod io;
pub mod reference;

#[doc(hidden)]
pub use tracing as __tracing;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, GraphError, GraphResult, Result, SerializationError};
pub use graph::{
    ChildArrayField, ChildField, ClassDescriptor, FieldDeclarations, ObjectClass, ObjectGraph, PtrArrayField,
    PtrField, ValueField,
};
pub use io::{JsonSerializer, ObjectFactory};
pub use types::{FieldRef, ObjectId};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Install logging from `config`
pub fn init(config: &Config) -> Result<()> {
    config.validate()?;
    crate::core::init_logging(&config.logging)?;
    log_info!("Initializing {} v{}", NAME, VERSION);
    Ok(())
}
