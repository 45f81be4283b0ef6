//! Heater output trait

/// Switched heater output with a supply sense input
///
/// Implementations drive the heater element via GPIO, SSR or MOSFET.
pub trait HeaterOutput {
    /// Turn the heater on or off
    fn set_on(&mut self, on: bool);

    /// Check if the heater is currently commanded on
    fn is_on(&self) -> bool;

    /// Sample the supply sense input
    ///
    /// Returns `true` when the heater's supply (and fuse) is intact,
    /// regardless of whether the heater is switched on.
    fn sense_power(&mut self) -> bool;
}
