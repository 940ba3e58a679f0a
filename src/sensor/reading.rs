// src/sensor/reading.rs

use super::frame::Frame;

/// One complete temperature/humidity sample.
///
/// A `Reading` is only ever produced from a fully decoded, non-busy frame;
/// there is no partially constructed state. The raw 20-bit device values are
/// kept so callers can pick their own precision; the fixed-point accessors
/// apply the exact device formulas
/// `humidity = raw * 100 / 2^20` (%RH) and
/// `temperature = raw * 200 / 2^20 - 50` (degrees C).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    raw_humidity: u32,
    raw_temperature: u32,
    captured_at: u32,
}

impl Reading {
    pub(crate) fn from_frame(frame: &Frame, captured_at: u32) -> Self {
        Reading {
            raw_humidity: frame.raw_humidity(),
            raw_temperature: frame.raw_temperature(),
            captured_at,
        }
    }

    /// Tick at which the frame was read off the bus.
    pub const fn captured_at(&self) -> u32 {
        self.captured_at
    }

    pub const fn raw_humidity(&self) -> u32 {
        self.raw_humidity
    }

    pub const fn raw_temperature(&self) -> u32 {
        self.raw_temperature
    }

    /// Relative humidity in thousandths of a percent (0..=100_000).
    pub const fn humidity_milli_percent(&self) -> u32 {
        ((self.raw_humidity as u64 * 100_000) >> 20) as u32
    }

    /// Temperature in millidegrees Celsius (-50_000..=150_000).
    pub const fn temperature_millicelsius(&self) -> i32 {
        ((self.raw_temperature as u64 * 200_000) >> 20) as i32 - 50_000
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f32 {
        self.raw_humidity as f32 * 100.0 / (1u32 << 20) as f32
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        self.raw_temperature as f32 * 200.0 / (1u32 << 20) as f32 - 50.0
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::command::FRAME_LEN;

    fn reading(bytes: [u8; FRAME_LEN]) -> Reading {
        Reading::from_frame(&Frame::from_bytes(bytes), 0)
    }

    #[test]
    fn test_zero_frame_decodes_to_floor_values() {
        let r = reading([0; FRAME_LEN]);
        assert_eq!(r.humidity_milli_percent(), 0);
        assert_eq!(r.temperature_millicelsius(), -50_000);
        assert_eq!(r.humidity_percent(), 0.0);
        assert_eq!(r.temperature_celsius(), -50.0);
    }

    #[test]
    fn test_synthetic_frame_matches_device_formulas() {
        // Raw humidity 0x19999, raw temperature 0xA6666.
        let r = reading([0x00, 0x19, 0x99, 0x9A, 0x66, 0x66]);

        let expected_humidity = 0x19999 as f64 * 100_000.0 / (1u32 << 20) as f64;
        let expected_temperature = 0xA6666 as f64 * 200_000.0 / (1u32 << 20) as f64 - 50_000.0;

        // Fixed-point results must land within one ULP of the exact values.
        assert!((r.humidity_milli_percent() as f64 - expected_humidity).abs() <= 1.0);
        assert!((r.temperature_millicelsius() as f64 - expected_temperature).abs() <= 1.0);
    }

    #[test]
    fn test_full_scale_bounds() {
        let r = reading([0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(r.humidity_milli_percent() <= 100_000);
        assert!(r.temperature_millicelsius() <= 150_000);
        assert_eq!(r.humidity_milli_percent(), 99_999);
        assert_eq!(r.temperature_millicelsius(), 149_999);
    }
}
