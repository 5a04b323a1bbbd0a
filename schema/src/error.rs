//! Schema resolution errors.

use std::fmt;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when resolving a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The serialized file descriptor set could not be decoded.
    DescriptorDecode {
        /// Decoder error description.
        cause: String,
    },

    /// The named message does not exist in the descriptor set.
    MessageNotFound {
        /// Fully-qualified message name that was requested.
        name: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DescriptorDecode { cause } => {
                write!(f, "failed to decode file descriptor set: {cause}")
            }
            Self::MessageNotFound { name } => {
                write!(f, "message {name} not found in descriptor set")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
