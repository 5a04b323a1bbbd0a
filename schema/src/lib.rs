//! Schema handling for the protobuf timeseries codec.
//!
//! This crate defines how a message schema drives the encoder:
//! - [`SchemaDescriptor`]: a protobuf message descriptor plus the deploy id
//!   used to detect schema swaps
//! - Field classification: which fields get a specialised custom coder and
//!   which fall through to the residual proto path
//! - The on-stream custom type ids written in the schema block
//!
//! # Design Principles
//!
//! - **Runtime schemas** - Descriptors arrive at runtime (e.g. from a schema
//!   registry); nothing here is generated at build time.
//! - **Deterministic classification** - The same descriptor always produces
//!   the same field partition and ordering.

mod classify;
mod descriptor;
mod error;

pub use classify::{classify, classify_into, CustomFieldDescr, FieldClassification};
pub use descriptor::SchemaDescriptor;
pub use error::{SchemaError, SchemaResult};

/// Number of bits used to encode one custom type id in the schema block.
///
/// Three bits cover the eight ids in [`CustomFieldType`] plus
/// [`NOT_CUSTOM_ENCODED`].
pub const NUM_BITS_CUSTOM_TYPE: u8 = 3;

/// Schema-block id for a field number with no custom coder binding.
pub const NOT_CUSTOM_ENCODED: u8 = 0;

/// The on-stream type id of a custom-encoded field.
///
/// Doubles and floats collapse to [`Float`](Self::Float) (both are carried as
/// 64-bit IEEE-754 patterns); integer kinds collapse by width and signedness;
/// `bytes` and `string` collapse to [`Bytes`](Self::Bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CustomFieldType {
    Float = 1,
    SignedInt64 = 2,
    SignedInt32 = 3,
    UnsignedInt64 = 4,
    UnsignedInt32 = 5,
    Bytes = 6,
    Bool = 7,
}

impl CustomFieldType {
    /// Returns the 3-bit schema-block id for this type.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}
