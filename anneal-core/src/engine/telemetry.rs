//! Per-round telemetry record

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::heater::HEATER_COUNT;
use crate::safety::{InterlockState, SafetyState};
use crate::sensor::{Channel, Reading, MAX_CHANNELS};

/// Snapshot emitted once per completed acquisition round
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Telemetry {
    /// Round number since start (1-based)
    pub round: u32,
    /// Time the round completed (ms)
    pub timestamp_ms: u32,
    /// Readings of every channel, in acquisition order
    pub readings: Vec<Reading, MAX_CHANNELS>,
    /// Commanded duty per heater (%)
    pub duty_percent: [u8; HEATER_COUNT],
    /// Supply sense per heater
    pub powered: [bool; HEATER_COUNT],
    /// Front-end bus fault
    pub bus_fault: bool,
    /// Interlock state after this tick
    pub interlock: InterlockState,
    /// Estop and link state after this tick
    pub safety: SafetyState,
    /// Periods that rolled over mid-round so far
    pub overruns: u32,
}

impl Telemetry {
    /// Reading for `channel`, if that channel is acquired
    pub fn reading(&self, channel: Channel) -> Option<&Reading> {
        self.readings.iter().find(|r| r.channel == channel)
    }

    /// Cold-junction temperature of this round
    ///
    /// Taken from the internal channel when there is one, otherwise from
    /// the first chip that reported it.
    pub fn cold_junction_c(&self) -> f32 {
        self.reading(Channel::Internal)
            .or_else(|| self.readings.first())
            .map_or(0.0, |r| r.internal_temp_c)
    }
}
