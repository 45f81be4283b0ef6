//! Fault taxonomy and setup errors
//!
//! Runtime faults are never propagated as `Err`: they are sticky flags that
//! the safety interlock aggregates. The enums here name them so they can be
//! reported, and cover the few fallible setup operations.

use crate::heater::HeaterId;
use crate::sensor::{Channel, FaultFlags};

/// Which decoded value a range fault refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeKind {
    /// Cold-junction temperature
    Internal,
    /// Thermocouple temperature
    External,
}

/// A condition that forces the heaters off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultKind {
    /// Sensing bus not trusted (readback mismatch or conversion timeout)
    Bus,
    /// All-zero or all-ones frame on a channel
    FrameIntegrity(Channel),
    /// Thermocouple open or shorted, as reported by the chip
    Probe(Channel),
    /// Decoded value outside its plausible window
    Range(Channel, RangeKind),
    /// Heater supply not sensed (blown fuse or lost power)
    Power(HeaterId),
    /// No valid supervisory command within the timeout
    LinkStale,
}

impl FaultKind {
    /// Classify a reading's fault bits, most fundamental cause first
    pub fn from_flags(channel: Channel, flags: FaultFlags) -> Option<Self> {
        if flags.contains(FaultFlags::BUS) {
            Some(FaultKind::Bus)
        } else if flags.intersects(FaultFlags::FRAME_INTEGRITY) {
            Some(FaultKind::FrameIntegrity(channel))
        } else if flags.intersects(FaultFlags::PROBE) {
            Some(FaultKind::Probe(channel))
        } else if flags.contains(FaultFlags::INTERNAL_RANGE) {
            Some(FaultKind::Range(channel, RangeKind::Internal))
        } else if flags.contains(FaultFlags::EXTERNAL_RANGE) {
            Some(FaultKind::Range(channel, RangeKind::External))
        } else {
            None
        }
    }
}

/// Invalid engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Round period must be non-zero
    ZeroPeriod,
    /// Channel gap leaves no room to read every channel within one period
    GapTooLong,
    /// Link timeout must be non-zero
    ZeroCommsTimeout,
    /// Temperature window is inverted or not finite
    InvalidWindow,
    /// Serialized configuration could not be encoded or decoded
    Persistence,
}

/// Resume refused because a fault is still standing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResumeRefused(pub FaultKind);
