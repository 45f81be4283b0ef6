//! Safety interlock
//!
//! Aggregates sensor, heater power and supervisory-link faults into a
//! single armed/shutdown decision.

pub mod interlock;

pub use interlock::{
    FaultInputs, InterlockEvent, InterlockState, SafetyInterlock, SafetyState, SafetyStatus,
    ShutdownReason, DEFAULT_COMMS_TIMEOUT_MS,
};
