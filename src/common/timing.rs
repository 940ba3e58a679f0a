// src/common/timing.rs

//! Timing constants for the AHT21 protocol, expressed in scheduler ticks.
//!
//! One tick is one millisecond (see [`crate::common::hal_traits::Timebase`]).
//! The datasheet values are minimums; implementations waiting on them should
//! treat the constants as lower bounds, not exact delays.

/// Settle time after power-up before the device accepts its first command.
pub const POWER_ON_SETTLE_TICKS: u32 = 40;

/// Minimum latency between a measurement trigger and a valid frame.
pub const MEASUREMENT_LATENCY_TICKS: u32 = 75;

/// Settle time after a soft reset before the device is usable again.
pub const SOFT_RESET_SETTLE_TICKS: u32 = 20;

/// Deadline for the device to answer an acknowledge slot.
pub const ACK_DEADLINE_TICKS: u32 = 10;

/// Deadline for a single byte transfer to leave `WouldBlock`.
pub const BYTE_IO_DEADLINE_TICKS: u32 = 10;

/// Default budget for taking the acquisition lock. Generous: it only has to
/// cover one full in-flight measurement cycle plus scheduling noise.
pub const DEFAULT_LOCK_TIMEOUT_TICKS: u32 = 250;

/// Elapsed ticks between two counter samples, tolerating counter wraparound.
#[inline]
pub fn ticks_since(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_since_simple() {
        assert_eq!(ticks_since(100, 25), 75);
        assert_eq!(ticks_since(40, 40), 0);
    }

    #[test]
    fn test_ticks_since_wraparound() {
        // Counter wrapped between the two samples.
        assert_eq!(ticks_since(5, u32::MAX - 9), 15);
        assert_eq!(ticks_since(0, u32::MAX), 1);
    }
}
