//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in anneal-core on top of `embedded-hal` 1.0:
//!
//! - Sensor front ends (ADS1120 multiplexed ADC, MAX31855 chip pair)
//! - Heater outputs (GPIO switch with supply sense)

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod frontend;
pub mod heater;
