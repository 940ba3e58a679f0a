// src/common/hal_traits.rs

use core::fmt::Debug;

/// Outcome of an acknowledge slot on the two-wire bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusAck {
    /// The addressed device pulled the line low.
    Ack,
    /// The line stayed high; the device refused or is absent.
    Nack,
}

/// Abstraction over the byte-level two-wire bus transport.
///
/// The driver sequences these primitives itself; implementations only have to
/// wiggle the lines. `wait_ack`, `send_byte` and `read_byte` may return
/// `nb::Error::WouldBlock` while the controller is busy — the driver converts
/// that into a cooperative yield bounded by a tick deadline.
pub trait I2cBus {
    /// Associated error type for transport faults.
    type Error: Debug;

    /// Brings the bus controller up. Called once during `initialize`.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Shuts the bus controller down. Called during `unbind`.
    fn deinit(&mut self) -> Result<(), Self::Error>;

    /// Generates a start (or repeated start) condition.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Generates a stop condition.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Samples the acknowledge slot after a sent byte.
    fn wait_ack(&mut self) -> nb::Result<BusAck, Self::Error>;

    /// Clocks one byte out onto the bus.
    fn send_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Clocks one byte in from the bus.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Acknowledges a received byte (more bytes follow).
    fn send_ack(&mut self) -> Result<(), Self::Error>;

    /// Refuses further bytes after the last read.
    fn send_nack(&mut self) -> Result<(), Self::Error>;

    /// Optional register-level fast path: write `payload` to `device` as one
    /// transaction. Returns `None` when the transport has no such engine and
    /// the driver should fall back to the byte primitives above.
    fn write_register(&mut self, device: u8, payload: &[u8]) -> Option<Result<(), Self::Error>> {
        let _ = (device, payload);
        None
    }

    /// Optional register-level fast path: fill `buffer` from `device` as one
    /// transaction. `None` selects the byte-level fallback.
    fn read_register(&mut self, device: u8, buffer: &mut [u8]) -> Option<Result<(), Self::Error>> {
        let _ = (device, buffer);
        None
    }
}

/// Monotonic tick source. One tick is one millisecond (the platform SysTick
/// count in the reference integration).
///
/// The counter wraps at `u32::MAX`; all duration comparisons in this crate go
/// through [`crate::common::timing::ticks_since`], which tolerates wraparound.
pub trait Timebase {
    /// Current tick count.
    fn now_ticks(&self) -> u32;
}

/// Cooperative yield primitive supplied by the host scheduler.
///
/// Every wait in this crate calls `yield_now` in its poll loop instead of
/// spinning the processor.
pub trait TaskYield {
    /// Hands the processor to another task.
    fn yield_now(&mut self);
}

/// Binary mutual-exclusion token serializing physical bus transactions.
///
/// `try_acquire` must be a single non-blocking attempt; the service owns the
/// retry/yield/timeout loop around it, so a caller that gives up waiting
/// leaves no partial hold behind.
pub trait AcquisitionLock {
    /// Attempts to take the lock. Returns `true` on success.
    fn try_acquire(&mut self) -> bool;

    /// Releases a previously taken lock.
    fn release(&mut self);
}
