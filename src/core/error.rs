//! Error types and handling for the field graph
//!
//! Programmer errors (bad keywords, wrong field kinds, ownership violations)
//! surface as [`GraphError`]. Data errors (malformed documents, unknown
//! classes) surface as [`SerializationError`].

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Result of graph structure operations
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Main error type for the field graph
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph structure errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while building or mutating the object graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Object id does not refer to a live object
    #[error("Object not found: {id}")]
    ObjectNotFound {
        /// Display form of the missing id
        id: String,
    },

    /// No field with this keyword on the object
    #[error("Field not found: {keyword} on {class}")]
    FieldNotFound {
        /// Requested keyword
        keyword: String,
        /// Class keyword of the owning object
        class: String,
    },

    /// A field keyword was declared twice on the same object
    #[error("Duplicate field keyword: {keyword} on {class}")]
    DuplicateFieldKeyword {
        /// Offending keyword
        keyword: String,
        /// Class keyword of the owning object
        class: String,
    },

    /// Keyword is not a valid element name
    #[error("Invalid keyword: '{0}'")]
    InvalidKeyword(String),

    /// Object already owned by another field
    #[error("Object {id} already has a parent field")]
    AlreadyParented {
        /// Display form of the object id
        id: String,
    },

    /// Attaching the object would make it its own ancestor
    #[error("Attaching {id} would create an ownership cycle")]
    CycleDetected {
        /// Display form of the object id
        id: String,
    },

    /// Value type does not match what the field holds
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name received
        actual: String,
    },

    /// The field exists but is of a different kind
    #[error("Field {keyword} is a {actual} field, expected {expected}")]
    WrongFieldKind {
        /// Field keyword
        keyword: String,
        /// Expected kind name
        expected: String,
        /// Actual kind name
        actual: String,
    },

    /// Array index outside `0..=len`
    #[error("Index {index} out of range for {keyword} (len {len})")]
    IndexOutOfRange {
        /// Field keyword
        keyword: String,
        /// Requested index
        index: usize,
        /// Current array length
        len: usize,
    },

    /// Object class does not derive from the class a field holds
    #[error("Class mismatch: {source_class} does not derive from {destination}")]
    ClassMismatch {
        /// Class of the object being attached or pointed at
        source_class: String,
        /// Class required by the field
        destination: String,
    },

    /// Value field has no setter
    #[error("Field {0} is read-only")]
    ReadOnly(String),
}

/// Serialization/deserialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document has no usable `classKeyword`
    #[error("Document is missing a classKeyword")]
    MissingClassKeyword,

    /// Document class does not match the object being populated
    #[error("Class mismatch: document is {found}, object is {expected}")]
    ClassMismatch {
        /// Class keyword of the target object
        expected: String,
        /// Class keyword found in the document
        found: String,
    },

    /// No factory registration for the class keyword
    #[error("Unknown class keyword: {0}")]
    UnknownClass(String),

    /// Structurally invalid document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error indicates misuse of the API rather than bad data
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Error::Graph(_) | Error::InvalidInput(_))
    }

    /// Check if this error was caused by malformed or unexpected input data
    pub fn is_data_error(&self) -> bool {
        matches!(self, Error::Serialization(_) | Error::NotFound(_))
    }
}

impl GraphError {
    pub(crate) fn object_not_found(id: impl std::fmt::Display) -> Self {
        Self::ObjectNotFound { id: id.to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(SerializationError::Json(err))
    }
}
