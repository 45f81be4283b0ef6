//! Hardware abstraction traits
//!
//! These traits define the interface between the acquisition and safety
//! logic and hardware-specific implementations or external collaborators.

pub mod frontend;
pub mod heater;
pub mod supervisor;

pub use frontend::SensorFrontend;
pub use heater::HeaterOutput;
pub use supervisor::{ClosedLoopController, ErrorIndicator, IndicatorMode, SupervisoryLink};
