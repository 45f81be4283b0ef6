//! Heater duty control
//!
//! Converts commanded duty percentages into a single on-pulse per period
//! and tracks each channel's supply sense.

pub mod duty;

pub use duty::{duty_from_f32, on_time_ms, HeaterChannel, MAX_DUTY_PERCENT};

use crate::sensor::Channel;

/// Number of heater channels
pub const HEATER_COUNT: usize = 2;

/// Heater channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaterId {
    /// Heater paired with thermocouple A
    A,
    /// Heater paired with thermocouple B
    B,
}

impl HeaterId {
    /// All heaters in order
    pub const ALL: [HeaterId; HEATER_COUNT] = [HeaterId::A, HeaterId::B];

    /// Position in [`HeaterId::ALL`]
    pub const fn index(self) -> usize {
        match self {
            HeaterId::A => 0,
            HeaterId::B => 1,
        }
    }

    /// Thermocouple channel controlling this heater
    pub const fn channel(self) -> Channel {
        match self {
            HeaterId::A => Channel::ExternalA,
            HeaterId::B => Channel::ExternalB,
        }
    }
}
