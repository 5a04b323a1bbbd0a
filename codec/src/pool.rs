//! Pooling seams for buffers, readers, and encoders.
//!
//! The encoder itself never requires pooling: every trait here has a plain
//! heap fallback when unset. Pools exist so a database node can recycle the
//! large buffers and per-series encoders it churns through.

use crate::encoder::Encoder;
use crate::segment::SegmentReader;

/// Supplies and reclaims byte buffers for the encoder's output stream.
pub trait BytesPool: Send + Sync {
    /// Returns an empty buffer with at least the requested capacity.
    fn get(&self, capacity: usize) -> Vec<u8>;

    /// Returns a buffer to the pool.
    fn put(&self, buf: Vec<u8>);
}

/// Supplies and reclaims [`SegmentReader`]s handed out by `stream`.
pub trait SegmentReaderPool: Send + Sync {
    /// Returns a reader; its previous target is unspecified.
    fn get(&self) -> SegmentReader;

    /// Returns a reader to the pool.
    fn put(&self, reader: SegmentReader);
}

/// Supplies and reclaims encoder instances.
///
/// Unlike the buffer pool this seam is caller-driven: `close` cannot move the
/// encoder out of `&mut self`, so callers return closed encoders themselves
/// and revive them with `reset`.
pub trait EncoderPool: Send + Sync {
    /// Returns an encoder; it must be `reset` before use.
    fn get(&self) -> Encoder;

    /// Returns a closed encoder to the pool.
    fn put(&self, encoder: Encoder);
}
