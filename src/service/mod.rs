// src/service/mod.rs

//! Concurrency and caching layer over one [`Aht21`] driver.
//!
//! The service serializes physical bus traffic behind an
//! [`AcquisitionLock`], answers callers from a staleness-bounded cache, and
//! retries a busy sensor exactly once per request. Many logical callers
//! share one service through the [`worker`] queue adapter.

pub mod worker;

mod cache;

use crate::common::error::Aht21Error;
use crate::common::hal_traits::{AcquisitionLock, I2cBus, TaskYield, Timebase};
use crate::common::timing;
use crate::sensor::{Aht21, Reading};

use cache::ReadingCache;

// --- Public Re-exports ---
pub use worker::{Request, Response, Worker};

/// Which fields a caller wants out of a reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadKind {
    Temperature,
    Humidity,
    Both,
}

impl ReadKind {
    /// Converts the flag form carried by queued requests. Selecting nothing
    /// is not a valid request.
    pub fn from_flags(wants_temperature: bool, wants_humidity: bool) -> Option<Self> {
        match (wants_temperature, wants_humidity) {
            (true, true) => Some(ReadKind::Both),
            (true, false) => Some(ReadKind::Temperature),
            (false, true) => Some(ReadKind::Humidity),
            (false, false) => None,
        }
    }

    pub const fn wants_temperature(&self) -> bool {
        matches!(self, ReadKind::Temperature | ReadKind::Both)
    }

    pub const fn wants_humidity(&self) -> bool {
        matches!(self, ReadKind::Humidity | ReadKind::Both)
    }
}

/// Successful `start` outcomes. Starting a running service is benign and
/// reported as such rather than as an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartOutcome {
    /// The handshake ran and the service is now ready.
    Started,
    /// The service was already ready; no hardware was touched.
    AlreadyRunning,
}

/// A reading projected onto the fields the caller asked for.
///
/// Both values come from the same frame, so `captured_at` applies to
/// whichever fields are populated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub temperature_millicelsius: Option<i32>,
    pub humidity_milli_percent: Option<u32>,
    /// Tick at which the source frame was captured.
    pub captured_at: u32,
}

impl Measurement {
    fn select(reading: &Reading, kind: ReadKind) -> Self {
        Measurement {
            temperature_millicelsius: kind
                .wants_temperature()
                .then(|| reading.temperature_millicelsius()),
            humidity_milli_percent: kind
                .wants_humidity()
                .then(|| reading.humidity_milli_percent()),
            captured_at: reading.captured_at(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ServiceState {
    Constructed,
    Ready,
    Stopped,
}

/// Cached, lock-serialized acquisition front end for one sensor.
///
/// Construction is allocation only; no hardware is touched until
/// [`start`](Self::start). Exactly-once construction over a given driver is
/// enforced by move semantics: building a service consumes the driver.
#[derive(Debug)]
pub struct AcquisitionService<B, T, Y, L> {
    driver: Aht21<B, T, Y>,
    lock: L,
    cache: ReadingCache,
    state: ServiceState,
    lock_timeout_ticks: u32,
}

impl<B, T, Y, L> AcquisitionService<B, T, Y, L>
where
    B: I2cBus,
    T: Timebase,
    Y: TaskYield,
    L: AcquisitionLock,
{
    pub fn new(driver: Aht21<B, T, Y>, lock: L) -> Self {
        AcquisitionService {
            driver,
            lock,
            cache: ReadingCache::new(),
            state: ServiceState::Constructed,
            lock_timeout_ticks: timing::DEFAULT_LOCK_TIMEOUT_TICKS,
        }
    }

    /// Overrides the budget for taking the acquisition lock.
    pub fn with_lock_timeout(mut self, ticks: u32) -> Self {
        self.lock_timeout_ticks = ticks;
        self
    }

    /// Runs the sensor handshake once. Subsequent calls report
    /// [`StartOutcome::AlreadyRunning`] without touching the bus; a stopped
    /// service cannot be restarted through its old handle.
    pub fn start(&mut self) -> Result<StartOutcome, Aht21Error<B::Error>> {
        match self.state {
            ServiceState::Ready => Ok(StartOutcome::AlreadyRunning),
            ServiceState::Stopped => Err(Aht21Error::NotBound),
            ServiceState::Constructed => {
                self.driver.initialize()?;
                self.state = ServiceState::Ready;
                Ok(StartOutcome::Started)
            }
        }
    }

    /// Serves one reading no older than `max_age_ticks`.
    ///
    /// Fresh cache hits return without bus traffic. Otherwise the caller
    /// takes the acquisition lock (yielding, bounded by the lock timeout),
    /// re-checks the cache in case a concurrent caller refreshed it while
    /// this one waited, and only then runs a measurement cycle. A busy
    /// sensor is retried exactly once; the cache is overwritten only on
    /// success and the lock is released on every exit path.
    pub fn request_reading(
        &mut self,
        kind: ReadKind,
        max_age_ticks: u32,
    ) -> Result<Measurement, Aht21Error<B::Error>> {
        self.ensure_ready()?;
        if let Some(reading) = self.cache.fresh(self.driver.now_ticks(), max_age_ticks) {
            return Ok(Measurement::select(&reading, kind));
        }
        self.acquire_lock()?;
        if let Some(reading) = self.cache.fresh(self.driver.now_ticks(), max_age_ticks) {
            self.lock.release();
            return Ok(Measurement::select(&reading, kind));
        }
        let outcome = self.refresh();
        self.lock.release();
        Ok(Measurement::select(&outcome?, kind))
    }

    /// Raw status word from the device, for diagnostics. Serialized through
    /// the acquisition lock like any other bus transaction.
    pub fn sensor_status(&mut self) -> Result<u8, Aht21Error<B::Error>> {
        self.ensure_ready()?;
        self.acquire_lock()?;
        let outcome = self.driver.status();
        self.lock.release();
        outcome
    }

    /// Restarts the sensor without a power cycle. The cache keeps its last
    /// value; staleness bounds decide when it gets replaced.
    pub fn reset_sensor(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.ensure_ready()?;
        self.acquire_lock()?;
        let outcome = self.driver.soft_reset();
        self.lock.release();
        outcome
    }

    /// Unbinds the driver and stops the service. Idempotent; a second call
    /// does not touch the bus again.
    pub fn shutdown(&mut self) -> Result<(), Aht21Error<B::Error>> {
        if self.state == ServiceState::Stopped {
            return Ok(());
        }
        let outcome = self.driver.unbind();
        self.state = ServiceState::Stopped;
        outcome
    }

    /// Last successfully cached reading, regardless of age.
    pub fn last_reading(&self) -> Option<Reading> {
        self.cache.last()
    }

    fn ensure_ready(&self) -> Result<(), Aht21Error<B::Error>> {
        match self.state {
            ServiceState::Ready => Ok(()),
            ServiceState::Constructed => Err(Aht21Error::NotInitialized),
            ServiceState::Stopped => Err(Aht21Error::NotBound),
        }
    }

    /// Yielding acquire bounded by the lock timeout. Giving up affects only
    /// this caller and leaves no partial hold behind.
    fn acquire_lock(&mut self) -> Result<(), Aht21Error<B::Error>> {
        let started = self.driver.now_ticks();
        while !self.lock.try_acquire() {
            if timing::ticks_since(self.driver.now_ticks(), started) >= self.lock_timeout_ticks {
                return Err(Aht21Error::LockTimeout);
            }
            self.driver.yield_now();
        }
        Ok(())
    }

    /// One measurement cycle, retried exactly once when the sensor reports
    /// busy. Caller must hold the lock.
    fn refresh(&mut self) -> Result<Reading, Aht21Error<B::Error>> {
        let reading = match self.measure_once() {
            Err(Aht21Error::MeasurementNotReady) => self.measure_once()?,
            other => other?,
        };
        self.cache.store(reading);
        Ok(reading)
    }

    fn measure_once(&mut self) -> Result<Reading, Aht21Error<B::Error>> {
        self.driver.trigger_measurement()?;
        self.driver.wait_measurement_ready()?;
        self.driver.read_frame()
    }
}
