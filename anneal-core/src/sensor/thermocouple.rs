//! Type-T thermocouple conversion (ITS-90 reference functions)
//!
//! Polynomials are evaluated with Horner's scheme in `f32`; none of them
//! carries a constant term.

/// Forward coefficients, °C → µV (0°C to 400°C range, also used for the
/// cold junction which always sits near room temperature)
const FORWARD: [f32; 8] = [
    3.874_810_6e1,
    3.329_222_8e-2,
    2.061_824_3e-4,
    -2.188_225_7e-6,
    1.099_688_1e-8,
    -3.081_575_9e-11,
    4.547_913_5e-14,
    -2.751_290_2e-17,
];

/// Inverse coefficients, µV → °C, for non-positive voltages (-200°C to 0°C)
const INVERSE_NEGATIVE: [f32; 7] = [
    2.594_919_2e-2,
    -2.131_696_7e-7,
    7.901_869_2e-10,
    4.252_777_7e-13,
    1.330_447_3e-16,
    2.024_144_6e-20,
    1.266_817_1e-24,
];

/// Inverse coefficients, µV → °C, for positive voltages (0°C to 400°C)
const INVERSE_POSITIVE: [f32; 6] = [
    2.592_800e-2,
    -7.602_961e-7,
    4.637_791e-11,
    -2.165_394e-15,
    6.048_144e-20,
    -7.293_422e-25,
];

/// Seebeck coefficient assumed by type-T shift-register chips (µV/°C)
pub const CHIP_SENSITIVITY_UV_PER_C: f32 = 52.18;

/// Evaluate `c1*x + c2*x^2 + ... + cn*x^n`
fn polynomial(coefficients: &[f32], x: f32) -> f32 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c) * x
}

/// Thermoelectric voltage (µV) of a junction at `celsius`, referenced to 0°C
pub fn celsius_to_microvolts(celsius: f32) -> f32 {
    polynomial(&FORWARD, celsius)
}

/// Temperature (°C) of a junction producing `microvolts`, referenced to 0°C
///
/// The branch is chosen by the sign of the voltage, not the temperature.
pub fn microvolts_to_celsius(microvolts: f32) -> f32 {
    if microvolts <= 0.0 {
        polynomial(&INVERSE_NEGATIVE, microvolts)
    } else {
        polynomial(&INVERSE_POSITIVE, microvolts)
    }
}

/// Cold-junction compensation
///
/// Adds the voltage the junction would develop at `cold_junction_c` to the
/// measured thermocouple voltage and converts the sum back to °C.
pub fn compensate(thermocouple_uv: f32, cold_junction_c: f32) -> f32 {
    microvolts_to_celsius(thermocouple_uv + celsius_to_microvolts(cold_junction_c))
}

/// Recover the thermocouple voltage from a chip's linear reading
///
/// The chip reports `cold_junction + V / sensitivity`, so the difference
/// scaled by the sensitivity is the measured voltage.
pub fn chip_reading_to_microvolts(external_c: f32, cold_junction_c: f32) -> f32 {
    (external_c - cold_junction_c) * CHIP_SENSITIVITY_UV_PER_C
}
