//! Serialization: keywords, field I/O capability, object factory and JSON
//!
//! The [`JsonSerializer`] writes an object tree to a JSON document and reads
//! documents back, creating objects through an [`ObjectFactory`]. Copying and
//! casting objects are built on the same write-then-read path.

pub mod capability;
pub mod factory;
pub(crate) mod field_io;
pub mod json;
pub mod keyword;


pub use capability::{add_io_capability_to_field, FieldIoCapability, PendingReference};
pub use factory::ObjectFactory;
pub use json::{
    init_after_read_recursively, resolve_references_recursively, setup_before_save_recursively, FieldSelector,
    JsonSerializer,
};
pub use keyword::is_valid_element_name;
