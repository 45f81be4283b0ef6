//! Sensor data path
//!
//! Raw frames captured from the front end flow through integrity checks,
//! field decoding and type-T linearization into validated [`Reading`]s.

pub mod channel;
pub mod decode;
pub mod fault;
pub mod frame;
pub mod reading;
pub mod thermocouple;

pub use channel::{Channel, MAX_CHANNELS, MAX_EXTERNAL_CHANNELS};
pub use decode::{Decoder, FrontendVariant, TempWindow};
pub use fault::FaultFlags;
pub use frame::{ChipFrame, RawFrame};
pub use reading::Reading;
