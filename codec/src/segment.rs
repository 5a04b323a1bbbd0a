//! Immutable segments and readers over encoded stream bytes.

use std::io::{self, Read};

use bytes::Bytes;

/// An immutable chunk of encoded stream bytes.
///
/// Internally the encoder owns its buffer outright; segments only appear at
/// the ownership boundary (`stream`, `discard`), where the bytes become
/// ref-counted so pools and callers can share them safely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    head: Bytes,
}

impl Segment {
    /// Creates an empty segment.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps an owned buffer without copying.
    #[must_use]
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self {
            head: Bytes::from(buf),
        }
    }

    /// Copies a borrowed slice into a new segment.
    #[must_use]
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            head: Bytes::copy_from_slice(bytes),
        }
    }

    /// Returns the segment length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.head.len()
    }

    /// Returns `true` if the segment holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }

    /// Returns the segment contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.head
    }
}

/// A read-only cursor over a [`Segment`].
///
/// Readers are reusable via [`reset`](Self::reset) and may be pooled through
/// [`SegmentReaderPool`](crate::pool::SegmentReaderPool).
#[derive(Debug, Default)]
pub struct SegmentReader {
    segment: Segment,
    pos: usize,
}

impl SegmentReader {
    /// Creates a reader positioned at the start of `segment`.
    #[must_use]
    pub fn new(segment: Segment) -> Self {
        Self { segment, pos: 0 }
    }

    /// Re-targets the reader at a new segment, rewinding to the start.
    pub fn reset(&mut self, segment: Segment) {
        self.segment = segment;
        self.pos = 0;
    }

    /// Returns the underlying segment.
    #[must_use]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.segment.len() - self.pos
    }
}

impl Read for SegmentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.segment.bytes()[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}
