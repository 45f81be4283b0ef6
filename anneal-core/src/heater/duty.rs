//! Time-sliced duty output
//!
//! The heater is switched on at the start of each period and off once the
//! on-time has elapsed: one long pulse per period, which suits the
//! apparatus's thermal time constant far better than fast PWM.

use crate::traits::HeaterOutput;

/// Largest accepted duty (%)
pub const MAX_DUTY_PERCENT: u8 = 100;

/// On-time for `duty_percent` of `period_ms`, rounded to the nearest ms
pub fn on_time_ms(period_ms: u32, duty_percent: u8) -> u32 {
    let duty = u64::from(duty_percent.min(MAX_DUTY_PERCENT));
    ((u64::from(period_ms) * duty + 50) / 100) as u32
}

/// Convert a controller output to a duty percentage
///
/// NaN maps to 0; values are clamped to 0..=100 and rounded.
pub fn duty_from_f32(duty: f32) -> u8 {
    if duty.is_nan() {
        return 0;
    }
    let clamped = duty.max(0.0).min(f32::from(MAX_DUTY_PERCENT));
    (clamped + 0.5) as u8
}

/// One heater channel
///
/// `duty_percent` is the only externally settable value; the on-time is
/// always derived from it.
pub struct HeaterChannel<H> {
    output: H,
    period_ms: u32,
    duty_percent: u8,
    on_time_ms: u32,
    powered: bool,
}

impl<H: HeaterOutput> HeaterChannel<H> {
    /// Create a heater channel with its output off and zero duty
    pub fn new(output: H, period_ms: u32) -> Self {
        let mut channel = Self {
            output,
            period_ms,
            duty_percent: 0,
            on_time_ms: 0,
            powered: false,
        };
        // Ensure heater starts off
        channel.output.set_on(false);
        channel
    }

    /// Set the duty cycle, clamped to 0..=100 %
    pub fn set_duty(&mut self, duty_percent: u8) {
        self.duty_percent = duty_percent.min(MAX_DUTY_PERCENT);
        self.on_time_ms = on_time_ms(self.period_ms, self.duty_percent);
    }

    /// Current duty cycle (%)
    pub fn duty_percent(&self) -> u8 {
        self.duty_percent
    }

    /// On-time per period derived from the duty
    pub fn on_time_ms(&self) -> u32 {
        self.on_time_ms
    }

    /// Duty period
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Drive the output for this point in the period
    ///
    /// Returns the output state that was written.
    pub fn update(&mut self, elapsed_in_period_ms: u32) -> bool {
        let on = match self.duty_percent {
            0 => false,
            MAX_DUTY_PERCENT => true,
            _ => elapsed_in_period_ms < self.on_time_ms,
        };
        self.output.set_on(on);
        on
    }

    /// Sample the supply sense input
    pub fn sample_power(&mut self) -> bool {
        self.powered = self.output.sense_power();
        self.powered
    }

    /// Supply state from the most recent sample
    pub fn has_power(&self) -> bool {
        self.powered
    }

    /// Zero the duty and drive the output low immediately
    ///
    /// Bypasses the period timing in [`update`](Self::update).
    pub fn force_shutdown(&mut self) {
        self.set_duty(0);
        self.output.set_on(false);
    }

    /// Check if the output is currently on
    pub fn is_on(&self) -> bool {
        self.output.is_on()
    }

    /// Underlying output
    pub fn output(&self) -> &H {
        &self.output
    }

    /// Underlying output, mutably
    pub fn output_mut(&mut self) -> &mut H {
        &mut self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock heater output for testing
    struct MockOutput {
        on: bool,
        writes: u32,
        supply: bool,
    }

    impl MockOutput {
        fn new() -> Self {
            Self {
                on: true,
                writes: 0,
                supply: true,
            }
        }
    }

    impl HeaterOutput for MockOutput {
        fn set_on(&mut self, on: bool) {
            self.on = on;
            self.writes += 1;
        }

        fn is_on(&self) -> bool {
            self.on
        }

        fn sense_power(&mut self) -> bool {
            self.supply
        }
    }

    #[test]
    fn test_starts_off() {
        let heater = HeaterChannel::new(MockOutput::new(), 1000);
        assert!(!heater.is_on());
        assert_eq!(heater.duty_percent(), 0);
        assert_eq!(heater.output().writes, 1);
    }

    #[test]
    fn test_on_time_rounding() {
        assert_eq!(on_time_ms(1000, 37), 370);
        assert_eq!(on_time_ms(999, 50), 500); // 499.5 rounds up
        assert_eq!(on_time_ms(10, 33), 3);
        assert_eq!(on_time_ms(1000, 250), 1000);
    }

    #[test]
    fn test_set_duty_clamps() {
        let mut heater = HeaterChannel::new(MockOutput::new(), 1000);
        heater.set_duty(150);
        assert_eq!(heater.duty_percent(), 100);
        assert_eq!(heater.on_time_ms(), 1000);
    }

    #[test]
    fn test_single_pulse_per_period() {
        let mut heater = HeaterChannel::new(MockOutput::new(), 1000);
        heater.set_duty(25);

        assert!(heater.update(0));
        assert!(heater.update(249));
        assert!(!heater.update(250));
        assert!(!heater.update(999));
        assert!(!heater.is_on());
    }

    #[test]
    fn test_full_and_zero_duty() {
        let mut heater = HeaterChannel::new(MockOutput::new(), 1000);
        heater.set_duty(100);
        assert!(heater.update(999));
        assert!(heater.update(5000));

        heater.set_duty(0);
        assert!(!heater.update(0));
    }

    #[test]
    fn test_force_shutdown_bypasses_timing() {
        let mut heater = HeaterChannel::new(MockOutput::new(), 1000);
        heater.set_duty(100);
        heater.update(10);
        assert!(heater.is_on());

        heater.force_shutdown();
        assert!(!heater.is_on());
        assert_eq!(heater.duty_percent(), 0);
        assert!(!heater.update(10));
    }

    #[test]
    fn test_power_sense_independent_of_duty() {
        let mut heater = HeaterChannel::new(MockOutput::new(), 1000);
        assert!(!heater.has_power());

        assert!(heater.sample_power());
        assert!(heater.has_power());

        heater.set_duty(100);
        heater.output_mut().supply = false;
        heater.update(0);
        assert!(!heater.sample_power());
        assert!(heater.is_on());
    }

    #[test]
    fn test_duty_from_f32() {
        assert_eq!(duty_from_f32(f32::NAN), 0);
        assert_eq!(duty_from_f32(-5.0), 0);
        assert_eq!(duty_from_f32(42.4), 42);
        assert_eq!(duty_from_f32(42.5), 43);
        assert_eq!(duty_from_f32(250.0), 100);
        assert_eq!(duty_from_f32(f32::INFINITY), 100);
    }
}
