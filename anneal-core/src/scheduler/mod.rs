//! Acquisition scheduler
//!
//! Time-multiplexes reads across channels that share one sensing bus.

pub mod acquisition;

pub use acquisition::{AcquisitionCursor, AcquisitionScheduler, Phase, RoundStatus};
