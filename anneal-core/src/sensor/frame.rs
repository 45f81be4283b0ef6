//! Raw frame layouts
//!
//! Two front-end variants produce differently shaped frames:
//!
//! - Multiplexed ADC: one 16-bit signed conversion code per channel. For the
//!   internal sensor the code is a left-justified 14-bit temperature.
//! - Shift-register chip: one 32-bit frame per channel carrying both the
//!   thermocouple and the cold-junction temperature.
//!
//! ```text
//!  31            18  17  16  15            4   3   2   1   0
//! ┌────────────────┬───┬───┬────────────────┬───┬───┬───┬───┐
//! │ external (s14) │ - │ F │ internal (s12) │ - │VCC│GND│OC │
//! └────────────────┴───┴───┴────────────────┴───┴───┴───┴───┘
//! ```

use super::fault::FaultFlags;

/// Multiplexed ADC internal sensor resolution (°C per count of the 14-bit field)
pub const ADC_INTERNAL_LSB_C: f32 = 0.031_25;

/// Shift-register chip thermocouple resolution (°C per count)
pub const CHIP_EXTERNAL_LSB_C: f32 = 0.25;

/// Shift-register chip cold-junction resolution (°C per count)
pub const CHIP_INTERNAL_LSB_C: f32 = 0.0625;

const EXTERNAL_MIN: i32 = -(1 << 13);
const EXTERNAL_MAX: i32 = (1 << 13) - 1;
const INTERNAL_MIN: i32 = -(1 << 11);
const INTERNAL_MAX: i32 = (1 << 11) - 1;

const FAULT_BIT: u32 = 1 << 16;
const STATUS_MASK: u32 = 0b0111;

/// A fixed-width bit pattern captured from the sensing hardware
///
/// Consumed exactly once by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RawFrame {
    /// 16-bit conversion code from the multiplexed ADC
    Code16(u16),
    /// 32-bit frame from a shift-register thermocouple chip
    Chip32(u32),
}

impl RawFrame {
    /// Frame-integrity faults for this frame
    ///
    /// All zeros means the data line is floating low (disconnected); all ones
    /// means the chip is not decoding clock/select and the line idles high.
    pub fn integrity(self) -> FaultFlags {
        let (bits, ones) = match self {
            RawFrame::Code16(code) => (u32::from(code), u32::from(u16::MAX)),
            RawFrame::Chip32(word) => (word, u32::MAX),
        };

        if bits == 0 {
            FaultFlags::ALL_ZEROS
        } else if bits == ones {
            FaultFlags::ALL_ONES
        } else {
            FaultFlags::empty()
        }
    }
}

/// Left-justified 14-bit internal temperature code to °C
pub fn adc_code_to_internal_c(code: u16) -> f32 {
    f32::from((code as i16) >> 2) * ADC_INTERNAL_LSB_C
}

/// Fields of a 32-bit shift-register chip frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipFrame {
    /// Thermocouple temperature, signed 14-bit counts of 0.25°C
    pub external_counts: i16,
    /// Cold-junction temperature, signed 12-bit counts of 0.0625°C
    pub internal_counts: i16,
    /// Fault-present flag (bit 16)
    pub fault: bool,
    /// Status bits {VCC short, GND short, open circuit} (bits 2..0)
    pub status: u8,
}

impl ChipFrame {
    /// Split a raw 32-bit word into its fields
    pub fn decode(word: u32) -> Self {
        Self {
            external_counts: ((word as i32) >> 18) as i16,
            internal_counts: (((word << 16) as i32) >> 20) as i16,
            fault: word & FAULT_BIT != 0,
            status: (word & STATUS_MASK) as u8,
        }
    }

    /// Pack the fields back into a 32-bit word
    ///
    /// Out-of-range counts are truncated to their field width.
    pub fn encode(&self) -> u32 {
        let external = (self.external_counts as u32 & 0x3FFF) << 18;
        let internal = (self.internal_counts as u32 & 0x0FFF) << 4;
        let fault = if self.fault { FAULT_BIT } else { 0 };
        external | fault | internal | (u32::from(self.status) & STATUS_MASK)
    }

    /// Build a fault-free frame from temperatures, quantized to the field LSBs
    pub fn from_celsius(internal_c: f32, external_c: f32) -> Self {
        Self {
            external_counts: quantize(external_c, CHIP_EXTERNAL_LSB_C, EXTERNAL_MIN, EXTERNAL_MAX),
            internal_counts: quantize(internal_c, CHIP_INTERNAL_LSB_C, INTERNAL_MIN, INTERNAL_MAX),
            fault: false,
            status: 0,
        }
    }

    /// Thermocouple temperature in °C as linearized by the chip
    pub fn external_c(&self) -> f32 {
        f32::from(self.external_counts) * CHIP_EXTERNAL_LSB_C
    }

    /// Cold-junction temperature in °C
    pub fn internal_c(&self) -> f32 {
        f32::from(self.internal_counts) * CHIP_INTERNAL_LSB_C
    }

    /// Probe fault bits reported by the chip
    pub fn probe_faults(&self) -> FaultFlags {
        let mut flags = FaultFlags::from_bits_truncate(u16::from(self.status));
        if self.fault && flags.is_empty() {
            flags.insert(FaultFlags::CHIP_FAULT);
        }
        flags
    }
}

/// Round to the nearest count, saturating at the field limits
fn quantize(value_c: f32, lsb_c: f32, min: i32, max: i32) -> i16 {
    let scaled = value_c / lsb_c;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    };
    rounded.clamp(min, max) as i16
}
