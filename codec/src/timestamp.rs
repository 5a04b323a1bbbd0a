//! Timestamp sub-coder: delta-of-delta compression for sample times.

use std::fmt;

use bitstream::BitWriter;

use crate::error::{EncodeError, EncodeResult};
use crate::types::TimeUnit;

/// The timestamp compression seam of the encoder.
///
/// The driver writes time-unit changes out-of-band via
/// [`write_time_unit`](Self::write_time_unit) instead of relying on any
/// in-band marker scheme: the surrounding protobuf bits can legitimately
/// collide with marker patterns, so markers cannot be trusted here.
pub trait TimestampCoder: fmt::Debug {
    /// Appends the delta encoding of `timestamp_nanos` to the stream.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::TimestampEncodeFailed`] if the timestamp cannot
    /// be represented in `time_unit`.
    fn write_time(
        &mut self,
        stream: &mut BitWriter,
        timestamp_nanos: i64,
        time_unit: TimeUnit,
    ) -> EncodeResult<()>;

    /// Appends a time-unit block and switches the coder to `time_unit`.
    fn write_time_unit(&mut self, stream: &mut BitWriter, time_unit: TimeUnit);

    /// Returns the unit deltas are currently written in.
    fn time_unit(&self) -> TimeUnit;
}

/// Gorilla-style delta-of-delta timestamp coder.
///
/// The first sample writes the delta from the configured start time; every
/// subsequent sample writes the second difference. Buckets:
///
/// | dod == 0       | `0`                    | 1 bit   |
/// | [-63, 64]      | `10` + 7-bit value     | 9 bits  |
/// | [-255, 256]    | `110` + 9-bit value    | 12 bits |
/// | [-2047, 2048]  | `1110` + 12-bit value  | 16 bits |
/// | otherwise      | `1111` + 64-bit value  | 68 bits |
#[derive(Debug)]
pub struct DeltaOfDeltaCoder {
    time_unit: TimeUnit,
    /// Timestamp of the previous sample (start time before any sample).
    prev_nanos: i64,
    /// Previous delta in units of `time_unit`.
    prev_delta: i64,
}

impl DeltaOfDeltaCoder {
    /// Creates a coder anchored at `start_nanos` writing deltas in
    /// `time_unit`.
    #[must_use]
    pub fn new(start_nanos: i64, time_unit: TimeUnit) -> Self {
        Self {
            time_unit,
            prev_nanos: start_nanos,
            prev_delta: 0,
        }
    }

    fn write_delta_of_delta(stream: &mut BitWriter, dod: i64) {
        if dod == 0 {
            stream.write_bit(false);
        } else if (-63..=64).contains(&dod) {
            stream.write_bits(0b10, 2);
            stream.write_bits(dod as u64, 7);
        } else if (-255..=256).contains(&dod) {
            stream.write_bits(0b110, 3);
            stream.write_bits(dod as u64, 9);
        } else if (-2047..=2048).contains(&dod) {
            stream.write_bits(0b1110, 4);
            stream.write_bits(dod as u64, 12);
        } else {
            stream.write_bits(0b1111, 4);
            stream.write_bits(dod as u64, 64);
        }
    }
}

impl TimestampCoder for DeltaOfDeltaCoder {
    fn write_time(
        &mut self,
        stream: &mut BitWriter,
        timestamp_nanos: i64,
        time_unit: TimeUnit,
    ) -> EncodeResult<()> {
        if time_unit != self.time_unit {
            // The driver announces unit changes before writing the time.
            return Err(EncodeError::TimestampEncodeFailed {
                cause: format!(
                    "time unit {:?} does not match coder unit {:?}",
                    time_unit, self.time_unit
                ),
            });
        }

        let delta_nanos = timestamp_nanos.wrapping_sub(self.prev_nanos);
        let unit_nanos = self.time_unit.nanos();
        if delta_nanos % unit_nanos != 0 {
            return Err(EncodeError::TimestampEncodeFailed {
                cause: format!(
                    "timestamp delta {delta_nanos}ns is not representable in {:?}",
                    self.time_unit
                ),
            });
        }

        let delta = delta_nanos / unit_nanos;
        let dod = delta.wrapping_sub(self.prev_delta);
        Self::write_delta_of_delta(stream, dod);

        self.prev_nanos = timestamp_nanos;
        self.prev_delta = delta;
        Ok(())
    }

    fn write_time_unit(&mut self, stream: &mut BitWriter, time_unit: TimeUnit) {
        stream.write_bits(u64::from(time_unit.id()), 8);
        self.time_unit = time_unit;
        // Deltas restart in the new unit.
        self.prev_delta = 0;
    }

    fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }
}
