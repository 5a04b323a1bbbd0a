//! Streaming protobuf timeseries encoder.
//!
//! This crate compresses a monotonically advancing sequence of
//! `(timestamp, protobuf message)` samples, all conforming to one configured
//! schema, into a compact append-only bit stream:
//!
//! - Timestamps are delta-of-delta coded by a pluggable
//!   [`TimestampCoder`].
//! - Scalar fields (floats, ints, bytes/strings, bools) get specialised
//!   per-field coders with their own mutable state, including an LRU
//!   dictionary of prior byte literals.
//! - Everything else (nested messages, enums, repeated fields, maps) goes
//!   through a residual path that re-marshals a diff against the previous
//!   sample.
//!
//! # Design Principles
//!
//! - **Single writer** - No internal locking; one encoder is driven by one
//!   caller at a time. Distinct encoders are fully independent.
//! - **Crisp partial-failure semantics** - A bit stream cannot be rewound, so
//!   failures after a sample's control bits are written make the encoder
//!   permanently unusable rather than leaving ambiguous output.
//! - **No steady-state allocations** - Scratch buffers are reused across
//!   samples and released on reset/close.

mod encoder;
mod error;
mod fields;
mod options;
mod pool;
mod segment;
mod timestamp;
mod types;

pub use encoder::Encoder;
pub use error::{EncodeError, EncodeResult};
pub use options::{Options, TimestampCoderFactory};
pub use pool::{BytesPool, EncoderPool, SegmentReaderPool};
pub use segment::{Segment, SegmentReader};
pub use timestamp::{DeltaOfDeltaCoder, TimestampCoder};
pub use types::{Datapoint, EncoderStats, TimeUnit};
