//! Tick engine
//!
//! Owns the acquisition scheduler, both heater channels and the safety
//! interlock, and drives them from one non-blocking call per loop pass.

pub mod telemetry;
pub mod tick;

pub use telemetry::Telemetry;
pub use tick::{Engine, TickOutcome};
