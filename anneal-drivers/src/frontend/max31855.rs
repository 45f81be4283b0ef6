//! MAX31855 thermocouple chip pair
//!
//! Each thermocouple has its own chip on its own chip select. The chips
//! convert continuously; a read simply clocks out the latest 32-bit frame,
//! so a channel is considered ready once one conversion time has passed
//! since it was selected.

use anneal_core::sensor::{Channel, FrontendVariant, RawFrame, MAX_EXTERNAL_CHANNELS};
use anneal_core::traits::SensorFrontend;
use embedded_hal::spi::SpiDevice;

/// MAX31855 configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Max31855Config {
    /// Worst-case conversion time (ms)
    pub conversion_ms: u32,
}

impl Default for Max31855Config {
    fn default() -> Self {
        Self { conversion_ms: 100 }
    }
}

/// Two MAX31855 chips, one per thermocouple
pub struct Max31855<D> {
    chips: [D; MAX_EXTERNAL_CHANNELS],
    config: Max31855Config,
    selected: usize,
    started_at_ms: u32,
    converting: bool,
    /// Conversion time has been observed to elapse
    ready: bool,
    bus_fault: bool,
}

impl<D: SpiDevice> Max31855<D> {
    /// Create a driver for chips on thermocouples A and B
    pub fn new(chips: [D; MAX_EXTERNAL_CHANNELS], config: Max31855Config) -> Self {
        Self {
            chips,
            config,
            selected: 0,
            started_at_ms: 0,
            converting: false,
            ready: false,
            bus_fault: false,
        }
    }

    /// Release the chip devices
    pub fn release(self) -> [D; MAX_EXTERNAL_CHANNELS] {
        self.chips
    }

    fn read_frame(&mut self, index: usize) -> Result<u32, D::Error> {
        let mut rx = [0u8; 4];
        self.chips[index].read(&mut rx)?;
        Ok(u32::from_be_bytes(rx))
    }
}

impl<D: SpiDevice> SensorFrontend for Max31855<D> {
    fn variant(&self) -> FrontendVariant {
        FrontendVariant::ShiftChip
    }

    fn channels(&self) -> &'static [Channel] {
        &Channel::EXTERNAL
    }

    fn init(&mut self) {
        self.converting = false;
        self.ready = false;
        // No configuration registers; a dummy read proves each chip answers
        self.bus_fault = (0..self.chips.len()).any(|index| self.read_frame(index).is_err());
        if self.bus_fault {
            error!("MAX31855 SPI error during init");
        }
    }

    fn select_channel(&mut self, channel: Channel) {
        // The internal channel is not serviced here, the scheduler never asks for it
        if let Some(index) = channel.external_index() {
            self.selected = index;
        }
    }

    fn start_conversion(&mut self, now_ms: u32) {
        self.started_at_ms = now_ms;
        self.converting = true;
        self.ready = false;
    }

    fn is_ready(&mut self, now_ms: u32) -> bool {
        if self.converting
            && now_ms.wrapping_sub(self.started_at_ms) >= self.config.conversion_ms
        {
            self.ready = true;
        }
        self.ready
    }

    fn read_conversion(&mut self) -> RawFrame {
        // The chip keeps returning its previous result until conversion ends
        if !self.ready {
            return RawFrame::Chip32(0);
        }
        self.converting = false;
        self.ready = false;

        match self.read_frame(self.selected) {
            Ok(word) => {
                self.bus_fault = false;
                RawFrame::Chip32(word)
            }
            Err(_) => {
                warn!("MAX31855 SPI error on chip {}", self.selected);
                self.bus_fault = true;
                RawFrame::Chip32(0)
            }
        }
    }

    fn bus_fault(&self) -> bool {
        self.bus_fault
    }
}
