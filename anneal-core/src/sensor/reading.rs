//! Validated per-channel readings

use super::channel::Channel;
use super::fault::FaultFlags;

/// Result of one channel read
///
/// Temperatures that failed validation are reported as 0 with the matching
/// bit set in `fault_flags`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Channel this reading belongs to
    pub channel: Channel,
    /// Cold-junction temperature (°C)
    pub internal_temp_c: f32,
    /// Thermocouple temperature before cold-junction correction (°C)
    pub external_temp_raw_c: f32,
    /// Thermocouple temperature after cold-junction correction (°C)
    pub external_temp_corrected_c: f32,
    /// Faults detected while producing this reading
    pub fault_flags: FaultFlags,
}

impl Reading {
    /// A reading with all temperatures at 0 and no faults
    pub const fn empty(channel: Channel) -> Self {
        Self {
            channel,
            internal_temp_c: 0.0,
            external_temp_raw_c: 0.0,
            external_temp_corrected_c: 0.0,
            fault_flags: FaultFlags::empty(),
        }
    }

    /// Check if any fault was recorded
    pub fn is_faulted(&self) -> bool {
        !self.fault_flags.is_empty()
    }

    /// The temperature a controller should act on
    ///
    /// Corrected thermocouple temperature for external channels, the
    /// cold-junction temperature for the internal channel.
    pub fn temperature_c(&self) -> f32 {
        if self.channel.is_external() {
            self.external_temp_corrected_c
        } else {
            self.internal_temp_c
        }
    }
}
