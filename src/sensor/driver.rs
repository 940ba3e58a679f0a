// src/sensor/driver.rs

//! Protocol state machine for one physical AHT21.
//!
//! The driver owns its transport, timebase and yield capabilities for the
//! lifetime of the binding and walks the lifecycle
//! `Unbound -> Bound -> Initialized -> {Initialized, Faulted}`. Every wait
//! (power-on settle, measurement latency, reset settle, `WouldBlock` retries)
//! yields cooperatively to the host scheduler instead of spinning.

use crate::common::command::{self, Command};
use crate::common::error::Aht21Error;
use crate::common::hal_traits::{BusAck, I2cBus, TaskYield, Timebase};
use crate::common::timing;

use super::frame::Frame;
use super::reading::Reading;

/// Lifecycle of a sensor binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No transport binding; every operation fails with `NotBound`.
    Unbound,
    /// Capabilities bound, power-up handshake not yet run.
    Bound,
    /// Handshake complete; measurement cycles may run.
    Initialized,
    /// Identity mismatch or transport fault. Terminal until `unbind` and
    /// `rebind`.
    Faulted,
}

/// Handle for one physical AHT21 behind a two-wire bus.
#[derive(Debug)]
pub struct Aht21<B, T, Y> {
    bus: B,
    clock: T,
    sched: Y,
    state: LinkState,
    last_trigger: Option<u32>,
}

impl<B, T, Y> Aht21<B, T, Y>
where
    B: I2cBus,
    T: Timebase,
    Y: TaskYield,
{
    /// Binds the transport, timebase and yield capabilities into a handle.
    ///
    /// Trait bounds guarantee every required primitive is present; dynamic
    /// capability tables are validated separately by
    /// [`crate::common::table::TransportTable::bind`].
    pub fn bind(bus: B, clock: T, sched: Y) -> Self {
        Aht21 {
            bus,
            clock,
            sched,
            state: LinkState::Bound,
            last_trigger: None,
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.state
    }

    /// Re-arms an unbound handle so `initialize` may run again. This is the
    /// recovery path out of `Faulted`: `unbind`, then `rebind`.
    pub fn rebind(&mut self) -> Result<(), Aht21Error<B::Error>> {
        match self.state {
            LinkState::Unbound => {
                self.state = LinkState::Bound;
                Ok(())
            }
            LinkState::Faulted => Err(Aht21Error::Faulted),
            LinkState::Bound | LinkState::Initialized => Ok(()),
        }
    }

    /// Runs the power-up handshake: bus init, >= 40 ms settle, identity
    /// check at the fixed address, status query, and the init command when
    /// the calibrated bit is unset (its NACK answer is expected and
    /// ignored).
    ///
    /// Idempotent: an already-initialized handle returns `Ok` without
    /// touching the bus.
    pub fn initialize(&mut self) -> Result<(), Aht21Error<B::Error>> {
        match self.state {
            LinkState::Initialized => return Ok(()),
            LinkState::Unbound => return Err(Aht21Error::NotBound),
            LinkState::Faulted => return Err(Aht21Error::Faulted),
            LinkState::Bound => {}
        }
        let outcome = self.initialize_io();
        let outcome = self.latch_fault(outcome);
        if outcome.is_ok() {
            self.state = LinkState::Initialized;
        }
        outcome
    }

    fn initialize_io(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.bus.init()?;
        self.wait_ticks(timing::POWER_ON_SETTLE_TICKS);
        let status = self.read_status_io(true)?;
        if status & command::STATUS_CALIBRATED == 0 {
            self.send_init_command()?;
        }
        Ok(())
    }

    /// Reads the raw status word. Useful for diagnostics beyond the busy and
    /// calibrated bits the driver interprets itself.
    pub fn status(&mut self) -> Result<u8, Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let outcome = self.read_status_io(false);
        self.latch_fault(outcome)
    }

    /// Writes the fixed 3-byte measurement command. Does not block for
    /// completion; pair with [`wait_measurement_ready`](Self::wait_measurement_ready)
    /// and [`read_frame`](Self::read_frame).
    pub fn trigger_measurement(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let payload = [
            Command::TriggerMeasurement.byte(),
            command::TRIGGER_PARAMETERS[0],
            command::TRIGGER_PARAMETERS[1],
        ];
        let outcome = self.command_frame(&payload);
        let outcome = self.latch_fault(outcome);
        if outcome.is_ok() {
            self.last_trigger = Some(self.clock.now_ticks());
        }
        outcome
    }

    /// Cooperatively yields until the minimum measurement latency (75 ms)
    /// has elapsed since the last trigger. Returns immediately when no
    /// measurement is pending.
    pub fn wait_measurement_ready(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        if let Some(triggered) = self.last_trigger {
            while timing::ticks_since(self.clock.now_ticks(), triggered)
                < timing::MEASUREMENT_LATENCY_TICKS
            {
                self.sched.yield_now();
            }
        }
        Ok(())
    }

    /// Reads and decodes the 6-byte measurement frame.
    ///
    /// Fails with [`Aht21Error::MeasurementNotReady`] when the busy bit is
    /// still set; the caller should re-run the measurement cycle.
    pub fn read_frame(&mut self) -> Result<Reading, Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let outcome = self.read_frame_io();
        self.latch_fault(outcome)
    }

    /// Restarts the device without a power cycle, then waits the 20 ms
    /// settle time. Any pending measurement is discarded.
    pub fn soft_reset(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let outcome = self.command_frame(&[Command::SoftReset.byte()]);
        let outcome = self.latch_fault(outcome);
        if outcome.is_ok() {
            self.last_trigger = None;
            self.wait_ticks(timing::SOFT_RESET_SETTLE_TICKS);
        }
        outcome
    }

    /// Puts the device into low-power standby.
    pub fn sleep(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let outcome = self.command_frame(&[Command::Sleep.byte()]);
        self.latch_fault(outcome)
    }

    /// Wakes the device from standby.
    pub fn wake(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_initialized()?;
        let outcome = self.command_frame(&[Command::Wake.byte()]);
        self.latch_fault(outcome)
    }

    /// Releases the transport binding (bus deinit included). Subsequent
    /// operations fail with `NotBound`. Calling `unbind` on an already
    /// unbound handle is a no-op.
    pub fn unbind(&mut self) -> Result<(), Aht21Error<B::Error>> {
        if self.state == LinkState::Unbound {
            return Ok(());
        }
        let outcome = self.bus.deinit().map_err(Aht21Error::Bus);
        self.state = LinkState::Unbound;
        self.last_trigger = None;
        outcome
    }

    /// Current tick count from the bound timebase.
    pub fn now_ticks(&self) -> u32 {
        self.clock.now_ticks()
    }

    pub(crate) fn yield_now(&mut self) {
        self.sched.yield_now();
    }

    // --- internal helpers ---

    fn ensure_initialized(&self) -> Result<(), Aht21Error<B::Error>> {
        match self.state {
            LinkState::Initialized => Ok(()),
            LinkState::Unbound => Err(Aht21Error::NotBound),
            LinkState::Bound => Err(Aht21Error::NotInitialized),
            LinkState::Faulted => Err(Aht21Error::Faulted),
        }
    }

    /// Transport faults and identity mismatches poison the handle.
    fn latch_fault<R>(
        &mut self,
        result: Result<R, Aht21Error<B::Error>>,
    ) -> Result<R, Aht21Error<B::Error>> {
        if matches!(
            result,
            Err(Aht21Error::Bus(_) | Aht21Error::Timeout | Aht21Error::IdentityMismatch)
        ) {
            self.state = LinkState::Faulted;
        }
        result
    }

    /// Cooperative wait for at least `ticks`.
    fn wait_ticks(&mut self, ticks: u32) {
        let from = self.clock.now_ticks();
        while timing::ticks_since(self.clock.now_ticks(), from) < ticks {
            self.sched.yield_now();
        }
    }

    /// Drives one non-blocking bus operation to completion, yielding on
    /// `WouldBlock` until `deadline_ticks` have elapsed.
    fn await_op<R>(
        bus: &mut B,
        clock: &T,
        sched: &mut Y,
        deadline_ticks: u32,
        mut op: impl FnMut(&mut B) -> nb::Result<R, B::Error>,
    ) -> Result<R, Aht21Error<B::Error>> {
        let started = clock.now_ticks();
        loop {
            match op(bus) {
                Ok(value) => return Ok(value),
                Err(nb::Error::WouldBlock) => {
                    if timing::ticks_since(clock.now_ticks(), started) >= deadline_ticks {
                        return Err(Aht21Error::Timeout);
                    }
                    sched.yield_now();
                }
                Err(nb::Error::Other(e)) => return Err(Aht21Error::Bus(e)),
            }
        }
    }

    fn send_with_ack(&mut self, byte: u8) -> Result<BusAck, Aht21Error<B::Error>> {
        Self::await_op(
            &mut self.bus,
            &self.clock,
            &mut self.sched,
            timing::BYTE_IO_DEADLINE_TICKS,
            |bus| bus.send_byte(byte),
        )?;
        Self::await_op(
            &mut self.bus,
            &self.clock,
            &mut self.sched,
            timing::ACK_DEADLINE_TICKS,
            |bus| bus.wait_ack(),
        )
    }

    /// Sends a byte and requires an ACK. A busy sensor refuses its address
    /// or a command byte with a NACK, which maps to `MeasurementNotReady`.
    fn send_expect_ack(&mut self, byte: u8) -> Result<(), Aht21Error<B::Error>> {
        match self.send_with_ack(byte)? {
            BusAck::Ack => Ok(()),
            BusAck::Nack => Err(Aht21Error::MeasurementNotReady),
        }
    }

    /// One addressed write transaction: start, address, payload, stop. The
    /// stop condition is generated on every exit path.
    fn command_frame(&mut self, payload: &[u8]) -> Result<(), Aht21Error<B::Error>> {
        if let Some(result) = self.bus.write_register(command::BUS_ADDRESS, payload) {
            return result.map_err(Aht21Error::Bus);
        }
        self.bus.start()?;
        let outcome = self.command_frame_open(payload);
        let stopped = self.bus.stop();
        outcome?;
        stopped?;
        Ok(())
    }

    /// Sends the init command. The device answers it with a NACK; that
    /// answer is expected and discarded.
    fn send_init_command(&mut self) -> Result<(), Aht21Error<B::Error>> {
        let payload = [Command::Initialize.byte()];
        if let Some(result) = self.bus.write_register(command::BUS_ADDRESS, &payload) {
            return result.map_err(Aht21Error::Bus);
        }
        self.bus.start()?;
        let outcome = self.send_init_open();
        let stopped = self.bus.stop();
        outcome?;
        stopped?;
        Ok(())
    }

    fn send_init_open(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.send_expect_ack(command::WRITE_ADDRESS)?;
        let _ = self.send_with_ack(Command::Initialize.byte())?;
        Ok(())
    }

    fn command_frame_open(&mut self, payload: &[u8]) -> Result<(), Aht21Error<B::Error>> {
        self.send_expect_ack(command::WRITE_ADDRESS)?;
        for byte in payload {
            self.send_expect_ack(*byte)?;
        }
        Ok(())
    }

    fn read_status_io(&mut self, probing_identity: bool) -> Result<u8, Aht21Error<B::Error>> {
        self.bus.start()?;
        let outcome = self.read_status_open(probing_identity);
        let stopped = self.bus.stop();
        let status = outcome?;
        stopped?;
        Ok(status)
    }

    fn read_status_open(&mut self, probing_identity: bool) -> Result<u8, Aht21Error<B::Error>> {
        // The first address ack doubles as the identity check during
        // initialization: no answer at 0x38 means the wrong (or no) device.
        match self.send_with_ack(command::WRITE_ADDRESS) {
            Ok(BusAck::Ack) => {}
            Ok(BusAck::Nack) => {
                return Err(if probing_identity {
                    Aht21Error::IdentityMismatch
                } else {
                    Aht21Error::MeasurementNotReady
                });
            }
            Err(Aht21Error::Timeout) if probing_identity => {
                return Err(Aht21Error::IdentityMismatch)
            }
            Err(e) => return Err(e),
        }
        self.send_expect_ack(Command::CheckStatus.byte())?;
        // Repeated start for the read phase.
        self.bus.start()?;
        self.send_expect_ack(command::READ_ADDRESS)?;
        let status = Self::await_op(
            &mut self.bus,
            &self.clock,
            &mut self.sched,
            timing::BYTE_IO_DEADLINE_TICKS,
            |bus| bus.read_byte(),
        )?;
        self.bus.send_nack()?;
        Ok(status)
    }

    fn read_frame_io(&mut self) -> Result<Reading, Aht21Error<B::Error>> {
        let frame = self.fetch_frame_bytes()?;
        if frame.is_busy() {
            return Err(Aht21Error::MeasurementNotReady);
        }
        Ok(Reading::from_frame(&frame, self.clock.now_ticks()))
    }

    fn fetch_frame_bytes(&mut self) -> Result<Frame, Aht21Error<B::Error>> {
        let mut bytes = [0u8; command::FRAME_LEN];
        if let Some(result) = self.bus.read_register(command::BUS_ADDRESS, &mut bytes) {
            result.map_err(Aht21Error::Bus)?;
            return Ok(Frame::from_bytes(bytes));
        }
        self.bus.start()?;
        let outcome = self.read_frame_open(&mut bytes);
        let stopped = self.bus.stop();
        outcome?;
        stopped?;
        Ok(Frame::from_bytes(bytes))
    }

    fn read_frame_open(
        &mut self,
        bytes: &mut [u8; command::FRAME_LEN],
    ) -> Result<(), Aht21Error<B::Error>> {
        self.send_expect_ack(command::READ_ADDRESS)?;
        for index in 0..command::FRAME_LEN {
            bytes[index] = Self::await_op(
                &mut self.bus,
                &self.clock,
                &mut self.sched,
                timing::BYTE_IO_DEADLINE_TICKS,
                |bus| bus.read_byte(),
            )?;
            if index + 1 < command::FRAME_LEN {
                self.bus.send_ack()?;
            } else {
                self.bus.send_nack()?;
            }
        }
        Ok(())
    }
}
