// src/sensor/frame.rs

use crate::common::command::{FRAME_LEN, STATUS_BUSY};

/// The fixed 6-byte measurement response.
///
/// Layout (datasheet section 5.4):
/// byte 0 is the status word; bytes 1-2 and the high nibble of byte 3 hold
/// the 20-bit raw humidity; the low nibble of byte 3 and bytes 4-5 hold the
/// 20-bit raw temperature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Frame { bytes }
    }

    /// The raw status word (byte 0).
    pub const fn status(&self) -> u8 {
        self.bytes[0]
    }

    /// True while the device is still measuring; the data bytes are not
    /// valid in that case.
    pub const fn is_busy(&self) -> bool {
        self.status() & STATUS_BUSY != 0
    }

    /// The packed 20-bit raw humidity value.
    pub const fn raw_humidity(&self) -> u32 {
        ((self.bytes[1] as u32) << 12) | ((self.bytes[2] as u32) << 4) | ((self.bytes[3] as u32) >> 4)
    }

    /// The packed 20-bit raw temperature value.
    pub const fn raw_temperature(&self) -> u32 {
        (((self.bytes[3] & 0x0F) as u32) << 16) | ((self.bytes[4] as u32) << 8) | (self.bytes[5] as u32)
    }
}
