// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod error;
pub mod hal_traits;
pub mod lock;
pub mod table;
pub mod timing;

// --- Re-export key types/traits for easier access ---

pub use command::Command;
pub use error::Aht21Error;
pub use hal_traits::{AcquisitionLock, BusAck, I2cBus, TaskYield, Timebase};
pub use lock::AtomicLock;
pub use table::{TableFault, TableTransport, TransportTable};

// Timing constants stay namespaced: users access them via `common::timing::*`.
