//! Measurement channels

/// Maximum number of channels serviced by one front end
pub const MAX_CHANNELS: usize = 3;

/// Maximum number of external thermocouple channels
pub const MAX_EXTERNAL_CHANNELS: usize = 2;

/// A measurement channel
///
/// The set is fixed at compile time: one internal (cold-junction) reference
/// and up to two external thermocouples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Front-end internal temperature sensor (cold junction)
    Internal,
    /// Thermocouple A
    ExternalA,
    /// Thermocouple B
    ExternalB,
}

impl Channel {
    /// All channels in canonical order
    pub const ALL: [Channel; MAX_CHANNELS] =
        [Channel::Internal, Channel::ExternalA, Channel::ExternalB];

    /// The external thermocouple channels, in heater order
    pub const EXTERNAL: [Channel; MAX_EXTERNAL_CHANNELS] = [Channel::ExternalA, Channel::ExternalB];

    /// Check if this is a thermocouple channel
    pub const fn is_external(self) -> bool {
        matches!(self, Channel::ExternalA | Channel::ExternalB)
    }

    /// Position in [`Channel::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Channel::Internal => 0,
            Channel::ExternalA => 1,
            Channel::ExternalB => 2,
        }
    }

    /// Position among the external channels, if this is one
    pub const fn external_index(self) -> Option<usize> {
        match self {
            Channel::Internal => None,
            Channel::ExternalA => Some(0),
            Channel::ExternalB => Some(1),
        }
    }
}
