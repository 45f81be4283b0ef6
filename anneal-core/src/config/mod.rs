//! Configuration types
//!
//! Board-agnostic engine configuration, optionally stored as postcard
//! binary data.

pub mod types;

pub use crate::sensor::TempWindow;
pub use types::*;
