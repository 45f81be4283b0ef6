//! Heater output drivers

pub mod gpio;

pub use gpio::GpioHeater;
