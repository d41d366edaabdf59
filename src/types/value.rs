/// Values held by data fields.
///
/// Any clonable, comparable, serde-serializable type with a portable name can
/// live in a data field. Conversion to and from `serde_json::Value` is the only
/// serialization path the graph uses.

use crate::core::error::SerializationError;
use crate::types::portable::PortableDataType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;
use std::fmt::Debug;

/// Bound satisfied by every type storable in a data field
pub trait FieldValue:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + PortableDataType + 'static
{
}

impl<T> FieldValue for T where
    T: Clone + PartialEq + Debug + Serialize + DeserializeOwned + PortableDataType + 'static
{
}

/// Convert a field value to JSON
pub fn to_json<T: FieldValue>(value: &T) -> Result<Json, SerializationError> {
    Ok(serde_json::to_value(value)?)
}

/// Convert JSON to a field value
pub fn from_json<T: FieldValue>(value: &Json) -> Result<T, SerializationError> {
    Ok(T::deserialize(value)?)
}
