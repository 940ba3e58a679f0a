// src/testutil.rs

//! Shared scripted mocks for the HAL traits.
//!
//! The controller structs (`BusCtl`, `ClockCtl`) live in the test body and
//! hand out cheap borrowing handles, so a test can stage bus traffic and
//! inspect counters while the driver owns its capabilities. The mock yield
//! advances the mock clock, which makes every cooperative wait in the crate
//! terminate deterministically.

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use crate::common::hal_traits::{BusAck, I2cBus, TaskYield, Timebase};
use crate::sensor::Aht21;

/// Transport error type used by the mock bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockBusError;

/// Scripted bus state shared between the test body and the driver.
///
/// Reads are served from a staged queue; an empty queue reports
/// `WouldBlock`, which is how tests provoke timeouts. Acks are served from
/// their own staged queue, defaulting to `Ack` when empty. Every sent byte
/// lands in the write log.
#[derive(Debug, Default)]
pub(crate) struct BusCtl {
    reads: RefCell<VecDeque<u8>>,
    acks: RefCell<VecDeque<BusAck>>,
    writes: RefCell<Vec<u8>>,
    pub inits: Cell<u32>,
    pub deinits: Cell<u32>,
    pub starts: Cell<u32>,
    pub stops: Cell<u32>,
}

impl BusCtl {
    pub fn new() -> Self {
        BusCtl::default()
    }

    pub fn stage_read(&self, bytes: &[u8]) {
        self.reads.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn stage_acks(&self, acks: &[BusAck]) {
        self.acks.borrow_mut().extend(acks.iter().copied());
    }

    /// How many times `byte` was clocked out onto the bus.
    pub fn writes_of(&self, byte: u8) -> usize {
        self.writes.borrow().iter().filter(|b| **b == byte).count()
    }
}

#[derive(Debug)]
pub(crate) struct MockBus<'a> {
    ctl: &'a BusCtl,
}

impl I2cBus for MockBus<'_> {
    type Error = MockBusError;

    fn init(&mut self) -> Result<(), MockBusError> {
        self.ctl.inits.set(self.ctl.inits.get() + 1);
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), MockBusError> {
        self.ctl.deinits.set(self.ctl.deinits.get() + 1);
        Ok(())
    }

    fn start(&mut self) -> Result<(), MockBusError> {
        self.ctl.starts.set(self.ctl.starts.get() + 1);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MockBusError> {
        self.ctl.stops.set(self.ctl.stops.get() + 1);
        Ok(())
    }

    fn wait_ack(&mut self) -> nb::Result<BusAck, MockBusError> {
        Ok(self.ctl.acks.borrow_mut().pop_front().unwrap_or(BusAck::Ack))
    }

    fn send_byte(&mut self, byte: u8) -> nb::Result<(), MockBusError> {
        self.ctl.writes.borrow_mut().push(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> nb::Result<u8, MockBusError> {
        self.ctl
            .reads
            .borrow_mut()
            .pop_front()
            .ok_or(nb::Error::WouldBlock)
    }

    fn send_ack(&mut self) -> Result<(), MockBusError> {
        Ok(())
    }

    fn send_nack(&mut self) -> Result<(), MockBusError> {
        Ok(())
    }
}

/// Mock tick counter, settable from the test body.
#[derive(Debug, Default)]
pub(crate) struct ClockCtl {
    pub ticks: Cell<u32>,
}

impl ClockCtl {
    pub fn new() -> Self {
        ClockCtl::default()
    }
}

#[derive(Debug)]
pub(crate) struct MockClock<'a> {
    ctl: &'a ClockCtl,
}

impl Timebase for MockClock<'_> {
    fn now_ticks(&self) -> u32 {
        self.ctl.ticks.get()
    }
}

/// Yielding advances the clock by one tick, so tick-bounded waits and
/// deadlines terminate.
#[derive(Debug)]
pub(crate) struct MockYield<'a> {
    ctl: &'a ClockCtl,
}

impl TaskYield for MockYield<'_> {
    fn yield_now(&mut self) {
        self.ctl.ticks.set(self.ctl.ticks.get().wrapping_add(1));
    }
}

/// A driver bound to the shared mock bus and clock.
pub(crate) fn bind_driver<'a>(
    bus: &'a BusCtl,
    clock: &'a ClockCtl,
) -> Aht21<MockBus<'a>, MockClock<'a>, MockYield<'a>> {
    Aht21::bind(
        MockBus { ctl: bus },
        MockClock { ctl: clock },
        MockYield { ctl: clock },
    )
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_reads_then_would_block() {
        let ctl = BusCtl::new();
        ctl.stage_read(&[0x11, 0x22]);
        let mut bus = MockBus { ctl: &ctl };
        assert_eq!(bus.read_byte(), Ok(0x11));
        assert_eq!(bus.read_byte(), Ok(0x22));
        assert_eq!(bus.read_byte(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_yield_advances_clock() {
        let clock = ClockCtl::new();
        let mut sched = MockYield { ctl: &clock };
        sched.yield_now();
        sched.yield_now();
        assert_eq!(clock.ticks.get(), 2);
    }
}
