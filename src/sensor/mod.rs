// src/sensor/mod.rs

// Wire-level protocol engine for one physical AHT21.

pub mod driver;
pub mod frame;
pub mod reading;

// --- Public Re-exports ---
pub use driver::{Aht21, LinkState};
pub use frame::Frame;
pub use reading::Reading;
