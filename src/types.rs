//! Type definitions for the field graph
//!
//! Identifiers, portable type names and the value trait shared by data fields.

/// Identifier types
pub mod ids;
/// Portable data type names
pub mod portable;
/// Field value trait and JSON conversion
pub mod value;

// Re-export commonly used types for convenience
pub use ids::{FieldRef, ObjectId};
pub use portable::PortableDataType;
pub use value::FieldValue;
