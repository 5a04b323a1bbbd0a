//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

const MAX_VARINT_BYTES: usize = 10;

/// A bit-level reader for walking packed binary data.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    /// The underlying byte buffer.
    data: &'a [u8],
    /// Current bit position (0 = MSB of first byte).
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Reads a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::UnexpectedEof`] if no bits remain.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        if self.bits_remaining() == 0 {
            return Err(BitError::UnexpectedEof {
                requested: 1,
                available: 0,
            });
        }
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer, MSB-first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::UnexpectedEof`] if insufficient bits remain.
    pub fn read_bits(&mut self, bits: usize) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits > self.bits_remaining() {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available: self.bits_remaining(),
            });
        }

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads an unsigned LEB128 varint, one byte at a time from the current
    /// bit position (which need not be byte-aligned).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidVarint`] if the encoding exceeds ten bytes.
    /// Returns [`BitError::UnexpectedEof`] if the buffer ends mid-varint.
    pub fn read_varint(&mut self) -> BitResult<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_bits(8)?;
            let payload = byte & 0x7F;
            // The tenth byte may only carry the top bit of a u64.
            if i == MAX_VARINT_BYTES - 1 && payload > 1 {
                return Err(BitError::InvalidVarint);
            }
            value |= payload << (7 * i as u32);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads `len` whole bytes from the current bit position into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::UnexpectedEof`] if fewer than `len * 8` bits remain.
    pub fn read_bytes(&mut self, len: usize, out: &mut Vec<u8>) -> BitResult<()> {
        for _ in 0..len {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(())
    }

    /// Skips bits until the reader is at a byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = (self.bit_pos + 7) / 8 * 8;
    }
}
