#![no_main]

use bitstream::{BitReader, BitWriter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Use input bytes to drive a bounded sequence of writer operations, then
    // read the whole stream back without panicking.
    let mut writer = BitWriter::new();
    let mut idx = 0usize;

    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 5;
        idx += 1;

        match op {
            0 => {
                writer.write_bit(data[idx.saturating_sub(1)] & 1 == 1);
            }
            1 => {
                let bits = (data[idx.saturating_sub(1)] % 64).saturating_add(1);
                writer.write_bits(u64::from(data[idx.saturating_sub(1)]), bits);
            }
            2 => {
                writer.pad_to_next_byte();
            }
            3 => {
                let take = (data[idx.saturating_sub(1)] as usize % 8).min(data.len() - idx);
                writer.write_bytes(&data[idx..idx + take]);
            }
            _ => {
                writer.write_varint(u64::from(data[idx.saturating_sub(1)]) << 9);
            }
        }
    }

    let total = writer.len();
    let mut reader = BitReader::new(writer.bytes());
    let mut read = 0usize;
    while read < total {
        let _ = reader.read_bit();
        read += 1;
    }
});
