//! Engine configuration
//!
//! Timing and plausibility parameters shared by every front-end variant.
//! Front-end specific knobs (reference voltage, gain, conversion time) live
//! with the drivers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::safety::DEFAULT_COMMS_TIMEOUT_MS;
use crate::sensor::{Decoder, FrontendVariant, TempWindow, MAX_CHANNELS};

/// Default round period, also the heater duty period
pub const DEFAULT_PERIOD_MS: u32 = 1000;

/// Default minimum gap between successive channel starts
pub const DEFAULT_CHANNEL_GAP_MS: u32 = 200;

/// Upper bound on a serialized [`EngineConfig`]
pub const MAX_SERIALIZED_LEN: usize = 64;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Acquisition round period (ms)
    pub period_ms: u32,
    /// Minimum gap between successive channel starts (ms)
    pub channel_gap_ms: u32,
    /// Supervisory-link freshness timeout (ms)
    pub comms_timeout_ms: u32,
    /// Cold-junction window override, variant default if `None`
    pub internal_window: Option<TempWindow>,
    /// Thermocouple window override, variant default if `None`
    pub external_window: Option<TempWindow>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            channel_gap_ms: DEFAULT_CHANNEL_GAP_MS,
            comms_timeout_ms: DEFAULT_COMMS_TIMEOUT_MS,
            internal_window: None,
            external_window: None,
        }
    }
}

impl EngineConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }

        // Every channel start must land inside one period
        let last_start = u64::from(self.channel_gap_ms) * (MAX_CHANNELS as u64 - 1);
        if last_start >= u64::from(self.period_ms) {
            return Err(ConfigError::GapTooLong);
        }

        if self.comms_timeout_ms == 0 {
            return Err(ConfigError::ZeroCommsTimeout);
        }

        let windows = [self.internal_window, self.external_window];
        if windows.iter().flatten().any(|w| !w.is_valid()) {
            return Err(ConfigError::InvalidWindow);
        }

        Ok(())
    }

    /// Build a decoder for `variant` with this config's window overrides
    pub fn decoder_for(&self, variant: FrontendVariant) -> Decoder {
        Decoder::new(variant).with_windows(self.internal_window, self.external_window)
    }

    /// Serialize into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Persistence)
    }

    /// Deserialize and validate a stored configuration
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Persistence)?;
        config.validate()?;
        Ok(config)
    }
}
