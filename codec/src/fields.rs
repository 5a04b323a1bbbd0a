//! Per-field custom coders and their mutable state.

use bitstream::BitWriter;
use schema::{CustomFieldDescr, CustomFieldType};
use xxhash_rust::xxh64::xxh64;

use crate::error::{EncodeError, EncodeResult};

/// Mutable coder state for one custom-encoded field.
#[derive(Debug)]
pub(crate) struct CustomFieldState {
    pub(crate) field_num: u32,
    pub(crate) field_type: CustomFieldType,
    pub(crate) coder: FieldCoder,
}

impl CustomFieldState {
    pub(crate) fn new(descr: CustomFieldDescr) -> Self {
        let coder = match descr.field_type {
            CustomFieldType::Float => FieldCoder::Float(FloatState::default()),
            CustomFieldType::SignedInt64 | CustomFieldType::SignedInt32 => {
                FieldCoder::SignedInt(SignedIntState::default())
            }
            CustomFieldType::UnsignedInt64 | CustomFieldType::UnsignedInt32 => {
                FieldCoder::UnsignedInt(UnsignedIntState::default())
            }
            CustomFieldType::Bytes => FieldCoder::Bytes(BytesState::default()),
            CustomFieldType::Bool => FieldCoder::Bool,
        };
        Self {
            field_num: descr.field_num,
            field_type: descr.field_type,
            coder,
        }
    }
}

/// Tagged per-field coder; dispatch stays branch-predictable on the hot path.
#[derive(Debug)]
pub(crate) enum FieldCoder {
    Float(FloatState),
    SignedInt(SignedIntState),
    UnsignedInt(UnsignedIntState),
    Bytes(BytesState),
    Bool,
}

/// TSZ-style XOR float compression state.
///
/// The first value XORs against an all-zero previous pattern with the
/// leading/trailing windows at 64, which forces the new-window path (and
/// makes a first value of exactly 0.0 a single `0` bit).
#[derive(Debug)]
pub(crate) struct FloatState {
    prev_bits: u64,
    prev_leading: u8,
    prev_trailing: u8,
}

impl Default for FloatState {
    fn default() -> Self {
        Self {
            prev_bits: 0,
            prev_leading: 64,
            prev_trailing: 64,
        }
    }
}

impl FloatState {
    pub(crate) fn write(&mut self, stream: &mut BitWriter, value: f64) {
        let bits = value.to_bits();
        let xor = bits ^ self.prev_bits;

        if xor == 0 {
            stream.write_bit(false);
            self.prev_bits = bits;
            return;
        }
        stream.write_bit(true);

        // The leading count is written in five bits, so clamp at 31; a
        // longer run just widens the meaningful window.
        let leading = (xor.leading_zeros() as u8).min(31);
        let trailing = xor.trailing_zeros() as u8;

        if leading >= self.prev_leading && trailing >= self.prev_trailing {
            stream.write_bit(false);
            let meaningful = 64 - self.prev_leading - self.prev_trailing;
            stream.write_bits(xor >> self.prev_trailing, meaningful);
        } else {
            stream.write_bit(true);
            let meaningful = 64 - leading - trailing;
            stream.write_bits(u64::from(leading), 5);
            // Stored as length-1 so a 64-bit window fits in six bits.
            stream.write_bits(u64::from(meaningful - 1), 6);
            stream.write_bits(xor >> trailing, meaningful);
            self.prev_leading = leading;
            self.prev_trailing = trailing;
        }

        self.prev_bits = bits;
    }
}

/// Delta state for signed integer fields.
#[derive(Debug, Default)]
pub(crate) struct SignedIntState {
    prev: i64,
}

impl SignedIntState {
    pub(crate) fn write(&mut self, stream: &mut BitWriter, value: i64) {
        let delta = value.wrapping_sub(self.prev);
        write_int_delta(stream, delta);
        self.prev = value;
    }
}

/// Delta state for unsigned integer fields.
///
/// Deltas are computed wrapping and pushed through the same zigzag emission
/// as signed fields; only the stored state and value extraction differ.
#[derive(Debug, Default)]
pub(crate) struct UnsignedIntState {
    prev: u64,
}

impl UnsignedIntState {
    pub(crate) fn write(&mut self, stream: &mut BitWriter, value: u64) {
        let delta = value.wrapping_sub(self.prev) as i64;
        write_int_delta(stream, delta);
        self.prev = value;
    }
}

/// Writes a zero/changed control bit, then a 2-bit width selector and the
/// zigzag-mapped delta zero-extended into the selected width.
///
/// Selector: `00` = 8 bits, `01` = 16, `10` = 32, `11` = 64. The smallest
/// width that holds the zigzag value is chosen. A paired decoder must mirror
/// this exactly.
fn write_int_delta(stream: &mut BitWriter, delta: i64) {
    if delta == 0 {
        stream.write_bit(false);
        return;
    }
    stream.write_bit(true);

    let zz = zigzag(delta);
    let (selector, width) = if zz < (1 << 8) {
        (0b00, 8)
    } else if zz < (1 << 16) {
        (0b01, 16)
    } else if zz < (1 << 32) {
        (0b10, 32)
    } else {
        (0b11, 64)
    };
    stream.write_bits(selector, 2);
    stream.write_bits(zz, width);
}

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// One bytes-dictionary entry: the content hash plus the byte range in the
/// output stream where the literal lives.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BytesDictEntry {
    hash: u64,
    start: usize,
    length: usize,
}

/// LRU dictionary state for a bytes/string field.
///
/// Entries reference already-written stream bytes rather than owning copies;
/// the tail is the most recently used entry.
#[derive(Debug, Default)]
pub(crate) struct BytesState {
    dict: Vec<BytesDictEntry>,
}

impl BytesState {
    pub(crate) fn write(
        &mut self,
        stream: &mut BitWriter,
        value: &[u8],
        lru_capacity: usize,
    ) -> EncodeResult<()> {
        let hash = xxh64(value, 0);

        if let Some(last) = self.dict.last() {
            if last.hash == hash && range_matches(stream, *last, value)? {
                // No-change control bit: identical to the previous write.
                stream.write_bit(false);
                return Ok(());
            }
        }
        stream.write_bit(true);

        let mut hit = None;
        for (idx, entry) in self.dict.iter().enumerate() {
            if entry.hash != hash {
                continue;
            }
            if range_matches(stream, *entry, value)? {
                hit = Some(idx);
                break;
            }
        }

        if let Some(idx) = hit {
            // Next bits are the dictionary index of a previous write.
            stream.write_bit(false);
            stream.write_bits(idx as u64, num_index_bits(lru_capacity));
            self.dict[idx..].rotate_left(1);
            return Ok(());
        }

        // New literal: varint length, pad so the literal starts on a byte
        // boundary (the dictionary stores its byte offset for read-back).
        stream.write_bit(true);
        stream.write_varint(value.len() as u64);
        stream.pad_to_next_byte();
        let start = stream.bytes().len();
        stream.write_bytes(value);

        self.push(
            BytesDictEntry {
                hash,
                start,
                length: value.len(),
            },
            lru_capacity,
        );
        Ok(())
    }

    fn push(&mut self, entry: BytesDictEntry, lru_capacity: usize) {
        if lru_capacity == 0 {
            return;
        }
        if self.dict.len() < lru_capacity {
            self.dict.push(entry);
            return;
        }
        // Evict the least recently used head by shifting left.
        self.dict.rotate_left(1);
        let tail = self.dict.len() - 1;
        self.dict[tail] = entry;
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = (u64, usize, usize)> + '_ {
        self.dict
            .iter()
            .map(|entry| (entry.hash, entry.start, entry.length))
    }
}

fn range_matches(stream: &BitWriter, entry: BytesDictEntry, value: &[u8]) -> EncodeResult<bool> {
    let bytes = stream.bytes();
    let end = entry.start + entry.length;
    if end > bytes.len() {
        tracing::error!(
            start = entry.start,
            length = entry.length,
            stream_len = bytes.len(),
            "bytes dictionary entry references a range outside the stream"
        );
        return Err(EncodeError::DictionaryOutOfBounds {
            start: entry.start,
            length: entry.length,
            stream_len: bytes.len(),
        });
    }
    Ok(&bytes[entry.start..end] == value)
}

/// Bits needed to address any index in an LRU of the given capacity.
pub(crate) fn num_index_bits(capacity: usize) -> u8 {
    if capacity <= 1 {
        return 0;
    }
    (usize::BITS - (capacity - 1).leading_zeros()) as u8
}

pub(crate) fn write_bool(stream: &mut BitWriter, value: bool) {
    stream.write_bit(value);
}
