//! Value types shared across the encoder.

/// A single timeseries sample as seen by the generic encoder interface.
///
/// The annotation (protobuf bytes) travels alongside rather than inside the
/// datapoint; `value` exists only to satisfy the interface and is forced to
/// zero by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Datapoint {
    /// Sample timestamp in Unix nanoseconds.
    pub timestamp_nanos: i64,
    /// Unused by the protobuf encoder; always zero after encoding.
    pub value: f64,
}

impl Datapoint {
    /// Creates a datapoint at the given timestamp with a zero value.
    #[must_use]
    pub const fn at(timestamp_nanos: i64) -> Self {
        Self {
            timestamp_nanos,
            value: 0.0,
        }
    }
}

/// Resolution in which timestamp deltas are written to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeUnit {
    Seconds = 1,
    Milliseconds = 2,
    Microseconds = 3,
    Nanoseconds = 4,
}

impl TimeUnit {
    /// Returns the length of one unit in nanoseconds.
    #[must_use]
    pub const fn nanos(self) -> i64 {
        match self {
            Self::Seconds => 1_000_000_000,
            Self::Milliseconds => 1_000_000,
            Self::Microseconds => 1_000,
            Self::Nanoseconds => 1,
        }
    }

    /// Returns the stable on-stream id of this unit.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Compression statistics for one encoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderStats {
    /// Sum of the annotation lengths accepted so far.
    pub uncompressed_bytes: usize,
    /// Current stream length in whole bytes (bits rounded up).
    pub compressed_bytes: usize,
}
