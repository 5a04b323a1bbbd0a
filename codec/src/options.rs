//! Encoder construction options.

use std::fmt;
use std::sync::Arc;

use crate::pool::{BytesPool, EncoderPool, SegmentReaderPool};
use crate::timestamp::TimestampCoder;
use crate::types::TimeUnit;

/// Builds a timestamp sub-coder for a stream starting at the given Unix-nanos
/// time with the given initial unit.
pub type TimestampCoderFactory = dyn Fn(i64, TimeUnit) -> Box<dyn TimestampCoder> + Send + Sync;

const DEFAULT_BYTES_DICT_LRU_SIZE: usize = 4;

/// Options shared by encoder instances.
///
/// Cloning is cheap; pools and factories are reference-counted.
#[derive(Clone)]
pub struct Options {
    default_time_unit: TimeUnit,
    byte_field_dictionary_lru_size: usize,
    bytes_pool: Option<Arc<dyn BytesPool>>,
    encoder_pool: Option<Arc<dyn EncoderPool>>,
    segment_reader_pool: Option<Arc<dyn SegmentReaderPool>>,
    timestamp_coder_factory: Option<Arc<TimestampCoderFactory>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_time_unit: TimeUnit::Seconds,
            byte_field_dictionary_lru_size: DEFAULT_BYTES_DICT_LRU_SIZE,
            bytes_pool: None,
            encoder_pool: None,
            segment_reader_pool: None,
            timestamp_coder_factory: None,
        }
    }
}

impl Options {
    /// Creates options with defaults: seconds resolution, LRU size 4, no
    /// pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time unit new streams start in.
    #[must_use]
    pub fn with_default_time_unit(mut self, unit: TimeUnit) -> Self {
        self.default_time_unit = unit;
        self
    }

    /// Sets the per-field bytes dictionary capacity.
    #[must_use]
    pub fn with_byte_field_dictionary_lru_size(mut self, size: usize) -> Self {
        self.byte_field_dictionary_lru_size = size;
        self
    }

    /// Attaches a buffer pool for stream buffers.
    #[must_use]
    pub fn with_bytes_pool(mut self, pool: Arc<dyn BytesPool>) -> Self {
        self.bytes_pool = Some(pool);
        self
    }

    /// Attaches an encoder pool for caller-side recycling.
    #[must_use]
    pub fn with_encoder_pool(mut self, pool: Arc<dyn EncoderPool>) -> Self {
        self.encoder_pool = Some(pool);
        self
    }

    /// Attaches a reader pool used by `stream`.
    #[must_use]
    pub fn with_segment_reader_pool(mut self, pool: Arc<dyn SegmentReaderPool>) -> Self {
        self.segment_reader_pool = Some(pool);
        self
    }

    /// Overrides how timestamp sub-coders are built.
    #[must_use]
    pub fn with_timestamp_coder_factory(mut self, factory: Arc<TimestampCoderFactory>) -> Self {
        self.timestamp_coder_factory = Some(factory);
        self
    }

    /// Returns the time unit new streams start in.
    #[must_use]
    pub fn default_time_unit(&self) -> TimeUnit {
        self.default_time_unit
    }

    /// Returns the per-field bytes dictionary capacity.
    #[must_use]
    pub fn byte_field_dictionary_lru_size(&self) -> usize {
        self.byte_field_dictionary_lru_size
    }

    /// Returns the attached buffer pool, if any.
    #[must_use]
    pub fn bytes_pool(&self) -> Option<&Arc<dyn BytesPool>> {
        self.bytes_pool.as_ref()
    }

    /// Returns the attached encoder pool, if any.
    #[must_use]
    pub fn encoder_pool(&self) -> Option<&Arc<dyn EncoderPool>> {
        self.encoder_pool.as_ref()
    }

    /// Returns the attached reader pool, if any.
    #[must_use]
    pub fn segment_reader_pool(&self) -> Option<&Arc<dyn SegmentReaderPool>> {
        self.segment_reader_pool.as_ref()
    }

    /// Returns the timestamp coder factory override, if any.
    #[must_use]
    pub fn timestamp_coder_factory(&self) -> Option<&Arc<TimestampCoderFactory>> {
        self.timestamp_coder_factory.as_ref()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("default_time_unit", &self.default_time_unit)
            .field(
                "byte_field_dictionary_lru_size",
                &self.byte_field_dictionary_lru_size,
            )
            .field("bytes_pool", &self.bytes_pool.is_some())
            .field("encoder_pool", &self.encoder_pool.is_some())
            .field("segment_reader_pool", &self.segment_reader_pool.is_some())
            .field(
                "timestamp_coder_factory",
                &self.timestamp_coder_factory.is_some(),
            )
            .finish()
    }
}
