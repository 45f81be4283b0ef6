//! Sensor front-end drivers

pub mod ads1120;
pub mod max31855;

pub use ads1120::{Ads1120, Ads1120Config, Gain};
pub use max31855::{Max31855, Max31855Config};
