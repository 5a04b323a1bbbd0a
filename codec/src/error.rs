//! Error types for encoder operations.

use std::fmt;

/// Result type for encoder operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that can occur while encoding samples.
///
/// Soft errors (unmarshal failures, unknown fields) leave the encoder usable;
/// hard errors are sticky and make every non-lifecycle operation fail with
/// [`HardFailed`](Self::HardFailed). [`SchemaMissing`](Self::SchemaMissing)
/// and [`DictionaryOutOfBounds`](Self::DictionaryOutOfBounds) indicate
/// programming bugs rather than runtime input trouble; see
/// [`is_invariant_violation`](Self::is_invariant_violation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Encode was called before any schema was set.
    SchemaMissing,

    /// The encoder has been closed.
    EncoderClosed,

    /// A previous sample failed mid-write; the encoder is unusable.
    HardFailed {
        /// The error that rendered the encoder unusable.
        cause: Box<EncodeError>,
    },

    /// The annotation carried fields absent from the configured schema.
    UnknownFields,

    /// The annotation could not be unmarshaled against the schema.
    UnmarshalFailed {
        /// Decoder error description.
        cause: String,
    },

    /// A custom-coded field held a value of an unexpected type.
    FieldTypeMismatch {
        /// The offending field number.
        field_num: u32,
    },

    /// The pruned residual message could not be marshaled.
    MarshalFailed {
        /// Encoder error description.
        cause: String,
    },

    /// The timestamp sub-coder rejected the sample.
    TimestampEncodeFailed {
        /// Sub-coder error description.
        cause: String,
    },

    /// A query that needs at least one sample ran on an empty encoder.
    NoEncodedDatapoints,

    /// A bytes-dictionary entry referenced a range outside the stream.
    DictionaryOutOfBounds {
        /// Byte offset the entry claims its literal starts at.
        start: usize,
        /// Length of the referenced literal.
        length: usize,
        /// Actual stream length in bytes.
        stream_len: usize,
    },
}

impl EncodeError {
    /// Returns `true` for error kinds that indicate a programming bug.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::SchemaMissing | Self::DictionaryOutOfBounds { .. }
        )
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaMissing => {
                write!(f, "schema is required before encoding")
            }
            Self::EncoderClosed => {
                write!(f, "encoder is closed")
            }
            Self::HardFailed { cause } => {
                write!(f, "encoder unusable due to previous hard error: {cause}")
            }
            Self::UnknownFields => {
                write!(f, "message has unknown fields")
            }
            Self::UnmarshalFailed { cause } => {
                write!(f, "error unmarshaling annotation into proto message: {cause}")
            }
            Self::FieldTypeMismatch { field_num } => {
                write!(f, "unexpected value type in field number {field_num}")
            }
            Self::MarshalFailed { cause } => {
                write!(f, "error marshaling residual proto message: {cause}")
            }
            Self::TimestampEncodeFailed { cause } => {
                write!(f, "error encoding timestamp: {cause}")
            }
            Self::NoEncodedDatapoints => {
                write!(f, "encoder has no encoded datapoints")
            }
            Self::DictionaryOutOfBounds {
                start,
                length,
                stream_len,
            } => {
                write!(
                    f,
                    "bytes position in LRU is outside of stream bounds, \
                     streamSize: {stream_len}, startPos: {start}, length: {length}"
                )
            }
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HardFailed { cause } => Some(cause),
            _ => None,
        }
    }
}
