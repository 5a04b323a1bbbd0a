//! The streaming protobuf encoder driver.

use bitstream::BitWriter;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage, Value};
use schema::{classify_into, CustomFieldType, FieldClassification, SchemaDescriptor};

use crate::error::{EncodeError, EncodeResult};
use crate::fields::{self, CustomFieldState, FieldCoder};
use crate::options::Options;
use crate::segment::{Segment, SegmentReader};
use crate::timestamp::{DeltaOfDeltaCoder, TimestampCoder};
use crate::types::{Datapoint, EncoderStats, TimeUnit};

const CURRENT_SCHEME_VERSION: u64 = 1;

/// Compresses a stream of `(timestamp, protobuf bytes)` samples that all
/// conform to one configured schema.
///
/// The encoder is a single-writer state machine: samples are appended in
/// order, the output is an append-only bit stream, and a failure after the
/// sample's control bits have been written leaves the encoder permanently
/// unusable (only `close`, `reset`, `discard`, and `discard_reset` remain).
///
/// An encoder is never usable without a schema; see [`set_schema`](Self::set_schema).
#[derive(Debug)]
pub struct Encoder {
    opts: Options,

    stream: BitWriter,
    schema_descr: Option<SchemaDescriptor>,
    classification: FieldClassification,
    custom_fields: Vec<CustomFieldState>,

    num_encoded: usize,
    last_encoded_dp: Datapoint,
    last_encoded: Option<DynamicMessage>,

    // Reused between calls to avoid per-sample allocation.
    changed_values: Vec<u32>,
    fields_changed_to_default: Vec<u32>,
    marshal_buf: Vec<u8>,
    unmarshaled: Option<DynamicMessage>,

    hard_err: Option<EncodeError>,
    has_encoded_schema: bool,
    closed: bool,

    uncompressed_bytes: usize,
    timestamp_coder: Box<dyn TimestampCoder>,
}

impl Encoder {
    /// Creates an encoder for a stream starting at `start_nanos`.
    #[must_use]
    pub fn new(start_nanos: i64, opts: Options) -> Self {
        let timestamp_coder = new_timestamp_coder(&opts, start_nanos);
        Self {
            opts,
            stream: BitWriter::new(),
            schema_descr: None,
            classification: FieldClassification::default(),
            custom_fields: Vec::new(),
            num_encoded: 0,
            last_encoded_dp: Datapoint::default(),
            last_encoded: None,
            changed_values: Vec::new(),
            fields_changed_to_default: Vec::new(),
            marshal_buf: Vec::new(),
            unmarshaled: None,
            hard_err: None,
            has_encoded_schema: false,
            closed: false,
            uncompressed_bytes: 0,
            timestamp_coder,
        }
    }

    /// Encodes one sample.
    ///
    /// `dp.value` is ignored and forced to zero; `annotation` must be the
    /// wire bytes of a message matching the configured schema.
    ///
    /// # Errors
    ///
    /// Unmarshal failures and unknown fields are soft: nothing is written and
    /// the encoder stays usable. Failures after the sample's control bits are
    /// written (timestamp, custom field, residual marshal) are hard: the
    /// error is returned and every subsequent non-lifecycle operation fails
    /// with [`EncodeError::HardFailed`].
    pub fn encode(
        &mut self,
        dp: Datapoint,
        time_unit: TimeUnit,
        annotation: &[u8],
    ) -> EncodeResult<()> {
        self.ensure_usable()?;
        let desc = match &self.schema_descr {
            Some(descr) => descr.message().clone(),
            None => {
                tracing::error!("encode called with no schema configured");
                return Err(EncodeError::SchemaMissing);
            }
        };

        let mut dp = dp;
        dp.value = 0.0;

        // Unmarshal first so a malformed annotation cannot leave a partially
        // encoded sample behind.
        let mut msg = self
            .unmarshaled
            .take()
            .unwrap_or_else(|| DynamicMessage::new(desc));
        msg.clear();
        if let Err(err) = msg.merge(annotation) {
            self.unmarshaled = Some(msg);
            return Err(EncodeError::UnmarshalFailed {
                cause: err.to_string(),
            });
        }
        if msg.unknown_fields().next().is_some() {
            self.unmarshaled = Some(msg);
            return Err(EncodeError::UnknownFields);
        }

        if self.num_encoded == 0 {
            self.encode_stream_header();
        }

        let schema_change = !self.has_encoded_schema;
        let unit_change = time_unit != self.timestamp_coder.time_unit();
        if schema_change || unit_change {
            // `1 0` is reserved for end-of-stream by the outer format, so a
            // change prefix is always `1 1` followed by the two change bits.
            self.stream.write_bit(true);
            self.stream.write_bit(true);
            self.stream.write_bit(unit_change);
            self.stream.write_bit(schema_change);

            if unit_change {
                // Unit changes are written here, out-of-band, instead of via
                // the sub-coder's marker scheme: the surrounding protobuf
                // bits can collide with any in-band marker pattern.
                self.timestamp_coder
                    .write_time_unit(&mut self.stream, time_unit);
            }
            if schema_change {
                self.encode_custom_schema_types();
                self.has_encoded_schema = true;
            }
        } else {
            self.stream.write_bit(false);
        }

        // Control bits are committed; anything that fails now leaves partial
        // data behind and renders the encoder unusable.
        let result = self.encode_sample_body(&mut msg, dp, time_unit);
        self.unmarshaled = Some(msg);
        match result {
            Ok(()) => {
                self.num_encoded += 1;
                self.last_encoded_dp = dp;
                self.uncompressed_bytes += annotation.len();
                Ok(())
            }
            Err(err) => {
                self.hard_err = Some(err.clone());
                Err(err)
            }
        }
    }

    fn encode_sample_body(
        &mut self,
        msg: &mut DynamicMessage,
        dp: Datapoint,
        time_unit: TimeUnit,
    ) -> EncodeResult<()> {
        self.timestamp_coder
            .write_time(&mut self.stream, dp.timestamp_nanos, time_unit)?;
        self.encode_custom_values(msg)?;
        self.encode_proto_values(msg)?;
        Ok(())
    }

    fn encode_stream_header(&mut self) {
        self.stream.write_varint(CURRENT_SCHEME_VERSION);
        self.stream
            .write_varint(self.opts.byte_field_dictionary_lru_size() as u64);
    }

    /// Writes the custom-schema block: the maximum custom field number, then
    /// one fixed-width type id per field number from one up to the maximum
    /// (zero labelling field numbers with no custom binding).
    fn encode_custom_schema_types(&mut self) {
        let max_field_num = self.classification.max_custom_field_num();
        self.stream.write_varint(u64::from(max_field_num));
        for field_num in 1..=max_field_num {
            let code = self
                .classification
                .custom_type_for(field_num)
                .map_or(schema::NOT_CUSTOM_ENCODED, CustomFieldType::code);
            self.stream
                .write_bits(u64::from(code), schema::NUM_BITS_CUSTOM_TYPE);
        }
    }

    fn encode_custom_values(&mut self, msg: &DynamicMessage) -> EncodeResult<()> {
        let lru_size = self.opts.byte_field_dictionary_lru_size();
        for state in self.custom_fields.iter_mut() {
            let field_num = state.field_num;
            let value = msg
                .get_field_by_number(field_num)
                .ok_or(EncodeError::FieldTypeMismatch { field_num })?;

            match &mut state.coder {
                FieldCoder::Float(float_state) => {
                    let val = match value.as_ref() {
                        Value::F64(v) => *v,
                        Value::F32(v) => f64::from(*v),
                        _ => return Err(EncodeError::FieldTypeMismatch { field_num }),
                    };
                    float_state.write(&mut self.stream, val);
                }
                FieldCoder::SignedInt(int_state) => {
                    let val = match value.as_ref() {
                        Value::I64(v) => *v,
                        Value::I32(v) => i64::from(*v),
                        _ => return Err(EncodeError::FieldTypeMismatch { field_num }),
                    };
                    int_state.write(&mut self.stream, val);
                }
                FieldCoder::UnsignedInt(int_state) => {
                    let val = match value.as_ref() {
                        Value::U64(v) => *v,
                        Value::U32(v) => u64::from(*v),
                        _ => return Err(EncodeError::FieldTypeMismatch { field_num }),
                    };
                    int_state.write(&mut self.stream, val);
                }
                FieldCoder::Bytes(bytes_state) => match value.as_ref() {
                    Value::Bytes(bytes) => {
                        bytes_state.write(&mut self.stream, bytes, lru_size)?;
                    }
                    Value::String(string) => {
                        bytes_state.write(&mut self.stream, string.as_bytes(), lru_size)?;
                    }
                    _ => return Err(EncodeError::FieldTypeMismatch { field_num }),
                },
                FieldCoder::Bool => match value.as_ref() {
                    Value::Bool(val) => fields::write_bool(&mut self.stream, *val),
                    _ => return Err(EncodeError::FieldTypeMismatch { field_num }),
                },
            }
        }
        Ok(())
    }

    /// Encodes the residual proto fields as a diff against the previous
    /// sample: unchanged fields are cleared from the working message and the
    /// pruned remainder is re-marshaled, with a bitset naming any fields that
    /// changed back to their default value (a plain merge cannot express
    /// those on the read side).
    fn encode_proto_values(&mut self, msg: &mut DynamicMessage) -> EncodeResult<()> {
        if self.classification.residual.is_empty() {
            // No residual fields at all; a single bit keeps the sample
            // self-describing.
            self.stream.write_bit(false);
            return Ok(());
        }

        self.changed_values.clear();
        self.fields_changed_to_default.clear();

        let desc = msg.descriptor();
        let last = self
            .last_encoded
            .get_or_insert_with(|| DynamicMessage::new(desc.clone()));

        for idx in 0..self.classification.residual.len() {
            let field_num = self.classification.residual[idx];
            let field = match desc.get_field(field_num) {
                Some(field) => field,
                None => continue,
            };

            if msg.get_field_by_number(field_num) == last.get_field_by_number(field_num) {
                msg.clear_field_by_number(field_num);
                continue;
            }

            let current = match msg.get_field_by_number(field_num) {
                Some(value) => value.into_owned(),
                None => continue,
            };
            if current.is_default(&field.kind()) {
                self.fields_changed_to_default.push(field_num);
            }
            self.changed_values.push(field_num);
            last.try_set_field_by_number(field_num, current)
                .map_err(|_| EncodeError::FieldTypeMismatch { field_num })?;
        }

        if self.changed_values.is_empty() {
            self.stream.write_bit(false);
            return Ok(());
        }

        self.marshal_buf.clear();
        msg.encode(&mut self.marshal_buf)
            .map_err(|err| EncodeError::MarshalFailed {
                cause: err.to_string(),
            })?;

        self.stream.write_bit(true);
        if self.fields_changed_to_default.is_empty() {
            self.stream.write_bit(false);
        } else {
            self.stream.write_bit(true);
            Self::encode_bitset(&mut self.stream, &self.fields_changed_to_default);
        }

        // The marshaled payload is retrieved as whole bytes on read; align
        // the varint and payload on a byte boundary.
        self.stream.pad_to_next_byte();
        self.stream.write_varint(self.marshal_buf.len() as u64);
        self.stream.write_bytes(&self.marshal_buf);
        Ok(())
    }

    /// Writes `varint(max)` followed by `max` membership bits; `values` are
    /// 1-indexed, bit positions 0-indexed.
    fn encode_bitset(stream: &mut BitWriter, values: &[u32]) {
        let max = values.iter().copied().max().unwrap_or(0);
        stream.write_varint(u64::from(max));
        for i in 1..=max {
            stream.write_bit(values.contains(&i));
        }
    }

    /// Returns the current stream length in bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// Returns `true` if nothing has been written to the stream.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Returns the number of samples accepted so far.
    #[must_use]
    pub fn num_encoded(&self) -> usize {
        self.num_encoded
    }

    /// Returns the last accepted datapoint (value always zero).
    ///
    /// # Errors
    ///
    /// Fails with [`EncodeError::NoEncodedDatapoints`] before the first
    /// sample, and with the usual usability errors after close / hard error.
    pub fn last_encoded(&self) -> EncodeResult<Datapoint> {
        self.ensure_usable()?;
        if self.num_encoded == 0 {
            return Err(EncodeError::NoEncodedDatapoints);
        }
        let mut dp = self.last_encoded_dp;
        dp.value = 0.0;
        Ok(dp)
    }

    /// Returns compression statistics for this encoder.
    #[must_use]
    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            uncompressed_bytes: self.uncompressed_bytes,
            compressed_bytes: (self.stream.len() + 7) / 8,
        }
    }

    /// Borrows the raw bytes of the underlying stream.
    ///
    /// The borrow is invalidated by any subsequent write; callers that need
    /// stable bytes use [`stream`](Self::stream) or [`discard`](Self::discard).
    ///
    /// # Errors
    ///
    /// Fails if the encoder is closed or hard-failed.
    pub fn bytes(&self) -> EncodeResult<&[u8]> {
        self.ensure_usable()?;
        Ok(self.stream.bytes())
    }

    /// Returns a reader over a copy of the current stream bytes, or `None`
    /// when nothing has been written yet.
    #[must_use]
    pub fn stream(&self) -> Option<SegmentReader> {
        if self.stream.is_empty() {
            return None;
        }
        let segment = Segment::copy_from_slice(self.stream.bytes());
        match self.opts.segment_reader_pool() {
            Some(pool) => {
                let mut reader = pool.get();
                reader.reset(segment);
                Some(reader)
            }
            None => Some(SegmentReader::new(segment)),
        }
    }

    /// Takes ownership of the accumulated buffer and closes the encoder.
    pub fn discard(&mut self) -> Segment {
        let segment = self.take_segment();
        self.close();
        segment
    }

    /// Like [`discard`](Self::discard), but resets the encoder for reuse
    /// instead of closing it.
    pub fn discard_reset(
        &mut self,
        start_nanos: i64,
        capacity: usize,
        descr: Option<SchemaDescriptor>,
    ) -> Segment {
        let segment = self.take_segment();
        self.reset(start_nanos, capacity, descr);
        segment
    }

    fn take_segment(&mut self) -> Segment {
        if self.stream.is_empty() {
            return Segment::empty();
        }
        Segment::from_vec(self.stream.discard())
    }

    /// Reverts all per-stream state and attaches a fresh buffer, making the
    /// encoder observationally equal to a newly constructed one.
    pub fn reset(&mut self, start_nanos: i64, capacity: usize, descr: Option<SchemaDescriptor>) {
        self.set_schema(descr);

        let buf = match self.opts.bytes_pool() {
            Some(pool) => pool.get(capacity),
            None => Vec::with_capacity(capacity),
        };
        self.stream.reset(buf);
        self.timestamp_coder = new_timestamp_coder(&self.opts, start_nanos);
        self.last_encoded_dp = Datapoint::default();

        // Rebuild coder and diff state even when set_schema was a same-deploy
        // no-op: the new stream must not inherit the previous stream's state.
        let message = self.schema_descr.as_ref().map(|d| d.message().clone());
        self.reset_schema_state(message);

        // Release scratch rather than parking large allocations in pools.
        self.marshal_buf = Vec::new();
        self.changed_values = Vec::new();
        self.fields_changed_to_default = Vec::new();

        self.hard_err = None;
        self.closed = false;
        self.num_encoded = 0;
        self.uncompressed_bytes = 0;
    }

    /// Configures the schema the next samples must conform to.
    ///
    /// Passing `None` clears schema state, leaving the encoder unusable until
    /// a schema is set again. Setting a descriptor whose non-empty deploy id
    /// matches the current one is a no-op; any other descriptor re-classifies
    /// the fields and arms the schema-change path for the next sample.
    pub fn set_schema(&mut self, descr: Option<SchemaDescriptor>) {
        match descr {
            None => {
                self.schema_descr = None;
                self.reset_schema_state(None);
            }
            Some(descr) => {
                if let Some(current) = &self.schema_descr {
                    if current.same_deploy(&descr) {
                        return;
                    }
                }
                tracing::debug!(deploy_id = descr.deploy_id(), "configuring encoder schema");
                let message = descr.message().clone();
                self.schema_descr = Some(descr);
                self.reset_schema_state(Some(message));
            }
        }
    }

    fn reset_schema_state(&mut self, message: Option<MessageDescriptor>) {
        match message {
            Some(message) => {
                classify_into(&message, &mut self.classification);
                self.custom_fields.clear();
                self.custom_fields.extend(
                    self.classification
                        .custom
                        .iter()
                        .map(|descr| CustomFieldState::new(*descr)),
                );
                self.last_encoded = Some(DynamicMessage::new(message.clone()));
                self.unmarshaled = Some(DynamicMessage::new(message));
            }
            None => {
                self.classification = FieldClassification::default();
                self.custom_fields.clear();
                self.last_encoded = None;
                self.unmarshaled = None;
            }
        }
        self.has_encoded_schema = false;
    }

    /// Closes the encoder, releasing its buffer.
    ///
    /// Idempotent. A closed encoder fails every operation except
    /// [`reset`](Self::reset), which revives it for reuse (typically via an
    /// encoder pool).
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.set_schema(None);
        self.timestamp_coder = new_timestamp_coder(&self.opts, 0);
        self.num_encoded = 0;
        self.uncompressed_bytes = 0;
        self.last_encoded_dp = Datapoint::default();
        self.hard_err = None;
        self.marshal_buf = Vec::new();
        self.changed_values = Vec::new();
        self.fields_changed_to_default = Vec::new();

        let buf = self.stream.discard();
        if let Some(pool) = self.opts.bytes_pool() {
            pool.put(buf);
        }
        self.closed = true;
    }

    /// Returns the options this encoder was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.opts
    }

    fn ensure_usable(&self) -> EncodeResult<()> {
        if self.closed {
            return Err(EncodeError::EncoderClosed);
        }
        if let Some(cause) = &self.hard_err {
            return Err(EncodeError::HardFailed {
                cause: Box::new(cause.clone()),
            });
        }
        Ok(())
    }
}

fn new_timestamp_coder(opts: &Options, start_nanos: i64) -> Box<dyn TimestampCoder> {
    match opts.timestamp_coder_factory() {
        Some(factory) => factory(start_nanos, opts.default_time_unit()),
        None => Box::new(DeltaOfDeltaCoder::new(
            start_nanos,
            opts.default_time_unit(),
        )),
    }
}
