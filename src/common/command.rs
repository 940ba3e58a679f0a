// src/common/command.rs

//! Wire-level constants fixed by the physical AHT21 device.

/// Fixed 7-bit bus address of the AHT21.
pub const BUS_ADDRESS: u8 = 0x38;

/// Address byte for a write-direction transfer.
pub const WRITE_ADDRESS: u8 = BUS_ADDRESS << 1;

/// Address byte for a read-direction transfer.
pub const READ_ADDRESS: u8 = (BUS_ADDRESS << 1) | 1;

/// Length of the measurement response frame.
pub const FRAME_LEN: usize = 6;

/// Command bytes understood by the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Read one byte of status word.
    CheckStatus = 0x71,
    /// Initialize and calibrate the sensor. The device answers this command
    /// with a NACK, which callers must ignore.
    Initialize = 0xBE,
    /// Start a measurement. Followed by [`TRIGGER_PARAMETERS`].
    TriggerMeasurement = 0xAC,
    /// Restart the sensor without a power cycle. Needs a settle wait
    /// afterwards before the device is usable again.
    SoftReset = 0xBA,
    /// Enter low-power standby.
    Sleep = 0xB8,
    /// Leave low-power standby.
    Wake = 0xB9,
}

impl Command {
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Parameter bytes following [`Command::TriggerMeasurement`]; the full
/// measurement command on the wire is `{0xAC, 0x33, 0x00}`.
pub const TRIGGER_PARAMETERS: [u8; 2] = [0x33, 0x00];

/// Status bit 7: a measurement is still in progress.
pub const STATUS_BUSY: u8 = 0x80;

/// Status bit 3: the device has been initialized/calibrated. When unset
/// after power-up, [`Command::Initialize`] must be issued.
pub const STATUS_CALIBRATED: u8 = 0x08;
