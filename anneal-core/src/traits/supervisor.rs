//! External collaborator traits
//!
//! The closed-loop controller, the supervisory link and the error indicator
//! live outside this crate; the engine only talks to them through these
//! interfaces.

use crate::sensor::Reading;

/// Turns temperatures into duty commands
///
/// Invoked once per completed acquisition round, with that round's
/// readings, and only while the interlock is armed.
pub trait ClosedLoopController {
    /// Compute duty percentages for heaters A and B
    ///
    /// Values outside 0..=100 are clamped, NaN is treated as 0.
    fn compute(&mut self, reading_a: &Reading, reading_b: &Reading) -> (f32, f32);
}

/// Command channel from the supervising host
pub trait SupervisoryLink {
    /// Milliseconds since the last valid command, `None` if none yet
    fn time_since_last_valid_command(&self) -> Option<u32>;

    /// Take a pending resume (estop clear) request
    fn take_resume(&mut self) -> bool;

    /// Take a pending stop request
    fn take_stop(&mut self) -> bool {
        false
    }
}

/// Error indicator display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndicatorMode {
    /// No error
    #[default]
    Off,
    /// Supervisory link not established or lost
    Slow,
    /// Fault standing or shut down by a fault
    Fast,
}

/// User-visible error indicator
pub trait ErrorIndicator {
    /// Switch display mode
    fn set_mode(&mut self, mode: IndicatorMode);
}
