//! GPIO heater output
//!
//! Heater switched by a GPIO pin (directly or via SSR/MOSFET), with a
//! second pin sensing the heater supply downstream of its fuse.

use anneal_core::traits::HeaterOutput;
use embedded_hal::digital::{InputPin, OutputPin};

/// GPIO heater output
///
/// The switch pin can be configured as active-high (default) or
/// active-low. The sense pin reads HIGH while the supply is present.
pub struct GpioHeater<P, S> {
    pin: P,
    sense: S,
    /// If true, heater ON = pin LOW
    inverted: bool,
    /// Current logical state (true = heater on)
    on: bool,
}

impl<P: OutputPin, S: InputPin> GpioHeater<P, S> {
    /// Create a new GPIO heater output
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin driving the switch
    /// - `sense`: The supply sense input
    /// - `inverted`: If true, heater is ON when pin is LOW (for active-low SSRs)
    pub fn new(pin: P, sense: S, inverted: bool) -> Self {
        let mut heater = Self {
            pin,
            sense,
            inverted,
            on: false,
        };
        // Ensure heater starts off
        heater.set_on(false);
        heater
    }

    /// Create a new GPIO heater with active-high output
    pub fn new_active_high(pin: P, sense: S) -> Self {
        Self::new(pin, sense, false)
    }

    /// Create a new GPIO heater with active-low output
    pub fn new_active_low(pin: P, sense: S) -> Self {
        Self::new(pin, sense, true)
    }

    /// Release the pins
    pub fn release(self) -> (P, S) {
        (self.pin, self.sense)
    }
}

impl<P: OutputPin, S: InputPin> HeaterOutput for GpioHeater<P, S> {
    fn set_on(&mut self, on: bool) {
        self.on = on;

        // Normal: on=true, inverted=false → high
        // Inverted: on=true, inverted=true → low
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            error!("heater pin write failed");
        }
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn sense_power(&mut self) -> bool {
        // An unreadable sense pin counts as no supply
        self.sense.is_high().unwrap_or(false)
    }
}
