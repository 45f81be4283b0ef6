//! Board-agnostic acquisition and safety engine for the heater controller
//!
//! This crate contains all logic that does not depend on specific
//! hardware implementations:
//!
//! - Hardware abstraction traits (sensor front end, heater output,
//!   external collaborators)
//! - Raw frame decoding and type-T thermocouple linearization
//! - Acquisition scheduler for channels sharing one bus
//! - Heater duty controller
//! - Safety interlock
//! - Tick engine tying everything together
//! - Configuration and telemetry types
//!
//! Everything is driven from a single non-blocking [`engine::Engine::tick`]
//! call that receives the current time as a parameter, so the whole core
//! can be exercised on a host with synthetic frames and time sequences.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod engine;
pub mod error;
pub mod heater;
pub mod safety;
pub mod scheduler;
pub mod sensor;
pub mod traits;
