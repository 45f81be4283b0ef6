//! Frame decoding and validation
//!
//! Integrity checks run first; a frame that fails them is never linearized.
//! Range checks then bound each decoded temperature to a physically
//! plausible window for the apparatus.

use super::channel::Channel;
use super::fault::FaultFlags;
use super::frame::{adc_code_to_internal_c, ChipFrame, RawFrame};
use super::reading::Reading;
use super::thermocouple;

/// Inclusive temperature window (°C)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempWindow {
    /// Lowest plausible temperature
    pub min_c: f32,
    /// Highest plausible temperature
    pub max_c: f32,
}

impl TempWindow {
    /// Create a window
    pub const fn new(min_c: f32, max_c: f32) -> Self {
        Self { min_c, max_c }
    }

    /// Check if `celsius` lies inside the window (NaN never does)
    pub fn contains(&self, celsius: f32) -> bool {
        celsius >= self.min_c && celsius <= self.max_c
    }

    /// Check the bounds are finite and ordered
    pub fn is_valid(&self) -> bool {
        self.min_c.is_finite() && self.max_c.is_finite() && self.min_c < self.max_c
    }
}

/// Which kind of sensing hardware produced the frames
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrontendVariant {
    /// One multiplexed ADC, reconfigured per channel
    MuxAdc {
        /// Thermocouple code scale: 2·Vref / (gain·2^16), in µV per count
        microvolts_per_count: f32,
    },
    /// One shift-register thermocouple chip per channel
    ShiftChip,
}

impl FrontendVariant {
    /// Plausible cold-junction window for this hardware
    pub const fn default_internal_window(&self) -> TempWindow {
        match self {
            // Reasonable room temperatures for the ADC die
            FrontendVariant::MuxAdc { .. } => TempWindow::new(3.0, 35.0),
            FrontendVariant::ShiftChip => TempWindow::new(10.0, 30.0),
        }
    }

    /// Plausible thermocouple window for this hardware
    pub const fn default_external_window(&self) -> TempWindow {
        match self {
            // Just above absolute zero to a hot room
            FrontendVariant::MuxAdc { .. } => TempWindow::new(-270.0, 35.0),
            FrontendVariant::ShiftChip => TempWindow::new(-270.0, 50.0),
        }
    }
}

/// Turns raw frames into validated readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoder {
    variant: FrontendVariant,
    internal_window: TempWindow,
    external_window: TempWindow,
}

impl Decoder {
    /// Create a decoder with the variant's default windows
    pub const fn new(variant: FrontendVariant) -> Self {
        Self {
            variant,
            internal_window: variant.default_internal_window(),
            external_window: variant.default_external_window(),
        }
    }

    /// Replace the default windows where an override is given
    pub fn with_windows(
        mut self,
        internal: Option<TempWindow>,
        external: Option<TempWindow>,
    ) -> Self {
        if let Some(window) = internal {
            self.internal_window = window;
        }
        if let Some(window) = external {
            self.external_window = window;
        }
        self
    }

    /// Hardware variant this decoder expects
    pub fn variant(&self) -> FrontendVariant {
        self.variant
    }

    /// Cold-junction window in use
    pub fn internal_window(&self) -> TempWindow {
        self.internal_window
    }

    /// Thermocouple window in use
    pub fn external_window(&self) -> TempWindow {
        self.external_window
    }

    /// Decode one frame captured on `channel`
    ///
    /// `cold_junction_c` is the most recent internal temperature; it is only
    /// used by the multiplexed variant, whose thermocouple frames carry no
    /// reference temperature of their own.
    pub fn decode(&self, channel: Channel, frame: RawFrame, cold_junction_c: f32) -> Reading {
        let mut reading = Reading::empty(channel);

        let integrity = frame.integrity();
        if !integrity.is_empty() {
            reading.fault_flags = integrity;
            return reading;
        }

        match (self.variant, frame) {
            (FrontendVariant::MuxAdc { .. }, RawFrame::Code16(code)) => {
                if channel.is_external() {
                    let (corrected, flags) = self.raw_to_external_temp(code, cold_junction_c);
                    reading.internal_temp_c = cold_junction_c;
                    reading.external_temp_raw_c = self.uncompensated_external_temp(code);
                    reading.external_temp_corrected_c = corrected;
                    reading.fault_flags = flags;
                } else {
                    let (internal, flags) = self.raw_to_internal_temp(code);
                    reading.internal_temp_c = internal;
                    reading.fault_flags = flags;
                }
            }
            (FrontendVariant::ShiftChip, RawFrame::Chip32(word)) => {
                self.decode_chip(&mut reading, ChipFrame::decode(word));
            }
            _ => {
                warn!("frame does not match front-end variant on {}", channel);
                reading.fault_flags = FaultFlags::BUS;
            }
        }

        reading
    }

    /// Multiplexed ADC internal sensor code to °C
    ///
    /// Outside the cold-junction window the temperature is reported as 0 and
    /// the internal range fault is set.
    pub fn raw_to_internal_temp(&self, code: u16) -> (f32, FaultFlags) {
        self.validate(
            adc_code_to_internal_c(code),
            self.internal_window,
            FaultFlags::INTERNAL_RANGE,
        )
    }

    /// Multiplexed ADC thermocouple code to cold-junction-corrected °C
    ///
    /// Outside the thermocouple window the temperature is reported as 0 and
    /// the external range fault is set.
    pub fn raw_to_external_temp(&self, code: u16, internal_temp_c: f32) -> (f32, FaultFlags) {
        let corrected = thermocouple::compensate(self.code_to_microvolts(code), internal_temp_c);
        self.validate(corrected, self.external_window, FaultFlags::EXTERNAL_RANGE)
    }

    /// Multiplexed ADC thermocouple code to °C with the junction referenced to 0°C
    pub fn uncompensated_external_temp(&self, code: u16) -> f32 {
        thermocouple::microvolts_to_celsius(self.code_to_microvolts(code))
    }

    fn code_to_microvolts(&self, code: u16) -> f32 {
        let scale = match self.variant {
            FrontendVariant::MuxAdc {
                microvolts_per_count,
            } => microvolts_per_count,
            FrontendVariant::ShiftChip => 0.0,
        };
        f32::from(code as i16) * scale
    }

    fn decode_chip(&self, reading: &mut Reading, frame: ChipFrame) {
        let cold_junction_c = frame.internal_c();
        let (internal, mut flags) = self.validate(
            cold_junction_c,
            self.internal_window,
            FaultFlags::INTERNAL_RANGE,
        );
        reading.internal_temp_c = internal;

        let probe = frame.probe_faults();
        if !probe.is_empty() {
            // Thermocouple data is meaningless while the chip reports a probe fault
            reading.fault_flags = flags | probe;
            return;
        }

        let raw = frame.external_c();
        let microvolts = thermocouple::chip_reading_to_microvolts(raw, cold_junction_c);
        let (corrected, external_flags) = self.validate(
            thermocouple::compensate(microvolts, cold_junction_c),
            self.external_window,
            FaultFlags::EXTERNAL_RANGE,
        );
        flags |= external_flags;

        reading.external_temp_raw_c = raw;
        reading.external_temp_corrected_c = corrected;
        reading.fault_flags = flags;
    }

    fn validate(&self, celsius: f32, window: TempWindow, fault: FaultFlags) -> (f32, FaultFlags) {
        if window.contains(celsius) {
            (celsius, FaultFlags::empty())
        } else {
            (0.0, fault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADC: FrontendVariant = FrontendVariant::MuxAdc {
        microvolts_per_count: 0.488_281_25,
    };

    fn close(a: f32, b: f32, tolerance: f32) -> bool {
        let d = a - b;
        d <= tolerance && d >= -tolerance
    }

    fn internal_code(celsius: f32) -> u16 {
        (((celsius / 0.031_25) as i16) << 2) as u16
    }

    #[test]
    fn test_internal_in_window() {
        let decoder = Decoder::new(ADC);
        let (temp, flags) = decoder.raw_to_internal_temp(internal_code(22.5));
        assert_eq!(temp, 22.5);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_internal_out_of_window_reports_zero() {
        let decoder = Decoder::new(ADC);
        let (temp, flags) = decoder.raw_to_internal_temp(internal_code(40.0));
        assert_eq!(temp, 0.0);
        assert_eq!(flags, FaultFlags::INTERNAL_RANGE);
    }

    #[test]
    fn test_external_compensated() {
        let decoder = Decoder::new(ADC);
        // -100°C probe against a 25°C cold junction: -4371µV
        let code = (-4371.0 / 0.488_281_25) as i16 as u16;
        let (temp, flags) = decoder.raw_to_external_temp(code, 25.0);
        assert!(flags.is_empty());
        assert!(close(temp, -100.0, 0.3));

        let uncompensated = decoder.uncompensated_external_temp(code);
        assert!(uncompensated < temp);
    }

    #[test]
    fn test_external_out_of_band() {
        let decoder = Decoder::new(ADC);
        // +2000µV plus a 25°C reference is well above 35°C
        let code = (2000.0 / 0.488_281_25) as i16 as u16;
        let (temp, flags) = decoder.raw_to_external_temp(code, 25.0);
        assert_eq!(temp, 0.0);
        assert_eq!(flags, FaultFlags::EXTERNAL_RANGE);
    }

    #[test]
    fn test_all_zero_frame() {
        let decoder = Decoder::new(ADC);
        let reading = decoder.decode(Channel::ExternalA, RawFrame::Code16(0), 25.0);
        assert_eq!(reading.fault_flags, FaultFlags::ALL_ZEROS);
        assert_eq!(reading.internal_temp_c, 0.0);
        assert_eq!(reading.external_temp_corrected_c, 0.0);

        let decoder = Decoder::new(FrontendVariant::ShiftChip);
        let reading = decoder.decode(Channel::ExternalB, RawFrame::Chip32(0), 0.0);
        assert_eq!(reading.fault_flags, FaultFlags::ALL_ZEROS);
        assert_eq!(reading.internal_temp_c, 0.0);
        assert_eq!(reading.external_temp_raw_c, 0.0);
    }

    #[test]
    fn test_chip_frame_decodes_both_temperatures() {
        let decoder = Decoder::new(FrontendVariant::ShiftChip);
        // What a chip with a linear 52.18µV/°C model reports for a -100°C probe
        // (-100°C is -3379µV on the type-T reference table)
        let measured = -3379.0 - thermocouple::celsius_to_microvolts(22.0);
        let chip_c = 22.0 + measured / thermocouple::CHIP_SENSITIVITY_UV_PER_C;
        let word = ChipFrame::from_celsius(22.0, chip_c).encode();
        let reading = decoder.decode(Channel::ExternalA, RawFrame::Chip32(word), 0.0);

        assert!(!reading.is_faulted());
        assert_eq!(reading.internal_temp_c, 22.0);
        assert!(close(reading.external_temp_raw_c, chip_c, 0.125));
        assert!(close(reading.external_temp_corrected_c, -100.0, 1.0));
    }

    #[test]
    fn test_chip_probe_fault_suppresses_external() {
        let decoder = Decoder::new(FrontendVariant::ShiftChip);
        let mut frame = ChipFrame::from_celsius(22.0, -50.0);
        frame.fault = true;
        frame.status = 0b001;
        let reading = decoder.decode(Channel::ExternalA, RawFrame::Chip32(frame.encode()), 0.0);

        assert_eq!(reading.fault_flags, FaultFlags::OPEN_CIRCUIT);
        assert_eq!(reading.internal_temp_c, 22.0);
        assert_eq!(reading.external_temp_corrected_c, 0.0);
    }

    #[test]
    fn test_window_override() {
        let decoder = Decoder::new(ADC).with_windows(Some(TempWindow::new(10.0, 30.0)), None);
        let (_, flags) = decoder.raw_to_internal_temp(internal_code(5.0));
        assert_eq!(flags, FaultFlags::INTERNAL_RANGE);
        assert_eq!(decoder.external_window(), ADC.default_external_window());
    }

    #[test]
    fn test_mismatched_frame_is_bus_fault() {
        let decoder = Decoder::new(ADC);
        let reading = decoder.decode(Channel::ExternalA, RawFrame::Chip32(0x0190_1900), 25.0);
        assert_eq!(reading.fault_flags, FaultFlags::BUS);
    }
}
