//! Sensor front-end trait

use crate::sensor::{Channel, FrontendVariant, RawFrame};

/// Sensing hardware shared by all channels
///
/// Implemented by the multiplexed ADC driver (one device, routing changed
/// per channel) and by the per-channel thermocouple chip driver (one chip
/// select per channel). Only the acquisition scheduler calls these methods,
/// so at most one channel transaction is ever in flight.
///
/// Every method is non-blocking except [`init`](Self::init), which may use
/// fixed settling delays.
pub trait SensorFrontend {
    /// Hardware variant, which decides how frames are decoded
    fn variant(&self) -> FrontendVariant;

    /// Channels this hardware services, in read order
    fn channels(&self) -> &'static [Channel];

    /// Configure the device
    ///
    /// A device that does not accept its configuration raises the bus fault;
    /// a successful init clears it.
    fn init(&mut self);

    /// Route the front end to `channel`
    fn select_channel(&mut self, channel: Channel);

    /// Start a conversion on the selected channel at `now_ms`
    fn start_conversion(&mut self, now_ms: u32);

    /// Poll for conversion completion
    ///
    /// Past the hardware timeout this returns `true` anyway and raises the
    /// bus fault, so a stalled bus never blocks the loop.
    fn is_ready(&mut self, now_ms: u32) -> bool;

    /// Fetch the completed conversion
    ///
    /// Returns an all-zero frame if no conversion is ready.
    fn read_conversion(&mut self) -> RawFrame;

    /// Check if the bus is currently untrusted
    fn bus_fault(&self) -> bool;
}
