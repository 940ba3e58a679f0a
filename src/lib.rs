// src/lib.rs

//! Driver and cached acquisition service for the AHT21 temperature/humidity
//! sensor.
//!
//! The crate is split into two layers that are designed together:
//!
//! * [`sensor`] — the wire-level protocol engine for one physical AHT21 on a
//!   two-wire bus: power-up handshake, measurement trigger, timed poll, 6-byte
//!   frame decode, reset/sleep/wake.
//! * [`service`] — the concurrency layer that makes the single sensor safely
//!   shareable under a cooperative scheduler: one transaction in flight at a
//!   time, a staleness-bounded reading cache, and a bounded request/response
//!   worker queue.
//!
//! Platform integration happens through the capability traits in
//! [`common::hal_traits`]: the caller supplies the bus primitives, a monotonic
//! tick source, and the scheduler's yield/lock primitives. A validated
//! function-pointer adapter ([`common::table::TransportTable`]) is provided
//! for C-style board support tables.

#![cfg_attr(not(test), no_std)]

pub mod common;
pub mod sensor;
pub mod service;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export key types for convenience
pub use common::error::Aht21Error;
pub use common::hal_traits::{AcquisitionLock, BusAck, I2cBus, TaskYield, Timebase};
pub use common::lock::AtomicLock;
pub use sensor::driver::{Aht21, LinkState};
pub use sensor::reading::Reading;
pub use service::worker::{Request, Response, Worker};
pub use service::{AcquisitionService, Measurement, ReadKind, StartOutcome};
