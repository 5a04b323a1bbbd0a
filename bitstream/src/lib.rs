//! Low-level bit packing primitives for the timeseries codec.
//!
//! This crate provides a growable [`BitWriter`] that owns its byte buffer and
//! a bounded [`BitReader`] for walking encoded streams. The writer is the
//! append-only output sink of the encoder; the reader exists for dictionary
//! read-back checks, fuzzing, and stream-verification tests.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded reads** - All reads are bounds-checked and never panic.
//! - **No domain knowledge** - This crate knows nothing about schemas,
//!   timestamps, or protobuf messages.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7);
//! writer.write_varint(300);
//!
//! let mut reader = BitReader::new(writer.bytes());
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! assert_eq!(reader.read_varint().unwrap(), 300);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::BitWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let writer = BitWriter::new();
        assert!(writer.is_empty());

        let reader = BitReader::new(writer.bytes());
        assert!(reader.is_empty());
    }

    #[test]
    fn single_bit_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);

        let mut reader = BitReader::new(writer.bytes());
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn mixed_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b1010, 4);
        writer.write_bit(false);
        writer.write_bits(0xFF, 8);
        writer.write_bits(42, 7);

        let mut reader = BitReader::new(writer.bytes());
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
        assert_eq!(reader.read_bits(7).unwrap(), 42);
    }

    #[test]
    fn varint_mid_byte_roundtrip() {
        // A varint written at an unaligned position is still a byte-at-a-time
        // LEB128 value when read back from the same bit offset.
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_varint(1_000_000);

        let mut reader = BitReader::new(writer.bytes());
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_varint().unwrap(), 1_000_000);
    }
}
