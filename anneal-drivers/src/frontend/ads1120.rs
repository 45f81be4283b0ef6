//! ADS1120 multiplexed ADC front end
//!
//! One 16-bit delta-sigma ADC reads the cold junction through its internal
//! temperature sensor and both thermocouples through its input mux. The
//! device is re-routed before every conversion and signals completion by
//! pulling DOUT/DRDY low.

use anneal_core::sensor::{Channel, FrontendVariant, RawFrame};
use anneal_core::traits::SensorFrontend;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;

const CMD_RESET: u8 = 0x07;
const CMD_START_SYNC: u8 = 0x08;
const CMD_RREG: u8 = 0x20;
const CMD_WREG: u8 = 0x40;

const DUMMY: u8 = 0xFF;

const REG0: u8 = 0x00;
const REG1: u8 = 0x01;

/// MUX field (REG0 bits 7:4): AIN0/AIN1 and AIN2/AIN3 differential pairs
const MUX_AIN0_AIN1: u8 = 0x00;
const MUX_AIN2_AIN3: u8 = 0x50;
/// Internal temperature sensor mode (REG1 bit 1)
const TEMP_SENSOR_MODE: u8 = 0x02;

/// Register file after reset
///
/// REG0: AIN0/AIN1, PGA enabled. REG1: 20 SPS, normal mode, single shot.
/// REG2: internal 2.048 V reference, no 50/60 Hz rejection, IDACs off.
/// REG3: DRDY also signalled on DOUT.
const BASE_REGISTERS: [u8; 4] = [0x00, 0x00, 0x00, 0x02];

/// Settling time after the reset command
const RESET_SETTLE_MS: u32 = 100;
/// Pause around each register write/readback
const REGISTER_SETTLE_MS: u32 = 5;

/// PGA gain settings supported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    X1,
    X2,
    X4,
    X8,
    X16,
    X32,
    X64,
    #[default]
    X128,
}

impl Gain {
    /// Amplification factor
    pub const fn factor(self) -> u8 {
        1 << self.log2()
    }

    /// REG0 gain field (bits 3:1)
    const fn bits(self) -> u8 {
        self.log2() << 1
    }

    const fn log2(self) -> u8 {
        match self {
            Gain::X1 => 0,
            Gain::X2 => 1,
            Gain::X4 => 2,
            Gain::X8 => 3,
            Gain::X16 => 4,
            Gain::X32 => 5,
            Gain::X64 => 6,
            Gain::X128 => 7,
        }
    }
}

/// ADS1120 configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ads1120Config {
    /// Reference voltage the code scale assumes (mV)
    pub vref_mv: u32,
    /// PGA gain, used both for the register and the code scale
    pub gain: Gain,
    /// Time after START past which the bus is declared faulty (ms)
    pub timeout_ms: u32,
}

impl Default for Ads1120Config {
    fn default() -> Self {
        Self {
            vref_mv: 2048,
            gain: Gain::X128,
            timeout_ms: 250,
        }
    }
}

impl Ads1120Config {
    /// Thermocouple code scale: 2·Vref / (gain·2^16), in µV per count
    pub fn microvolts_per_count(&self) -> f32 {
        let full_scale_uv = 2.0 * self.vref_mv as f32 * 1000.0;
        full_scale_uv / (f32::from(self.gain.factor()) * 65536.0)
    }

    /// Configuration register values written at init
    fn registers(&self) -> [u8; 4] {
        let mut registers = BASE_REGISTERS;
        registers[REG0 as usize] |= MUX_AIN0_AIN1 | self.gain.bits();
        registers
    }
}

/// ADS1120 front end
pub struct Ads1120<SPI, DRDY, D> {
    spi: SPI,
    drdy: DRDY,
    delay: D,
    config: Ads1120Config,
    registers: [u8; 4],
    started_at_ms: u32,
    converting: bool,
    timed_out: bool,
    init_fault: bool,
    /// Routing or START failed for the conversion in flight
    setup_fault: bool,
    /// Last data read failed
    read_fault: bool,
}

impl<SPI, DRDY, D> Ads1120<SPI, DRDY, D>
where
    SPI: SpiDevice,
    DRDY: InputPin,
    D: DelayNs,
{
    /// Create a driver; call [`SensorFrontend::init`] before use
    ///
    /// The SPI device must be configured for mode 1 (CPOL=0, CPHA=1).
    pub fn new(spi: SPI, drdy: DRDY, delay: D, config: Ads1120Config) -> Self {
        Self {
            spi,
            drdy,
            delay,
            registers: config.registers(),
            config,
            started_at_ms: 0,
            converting: false,
            timed_out: false,
            init_fault: false,
            setup_fault: false,
            read_fault: false,
        }
    }

    /// Driver configuration
    pub fn config(&self) -> &Ads1120Config {
        &self.config
    }

    /// Release the bus, DRDY pin and delay
    pub fn release(self) -> (SPI, DRDY, D) {
        (self.spi, self.drdy, self.delay)
    }

    fn command(&mut self, command: u8) -> Result<(), SPI::Error> {
        self.spi.write(&[command])
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), SPI::Error> {
        self.spi.write(&[CMD_WREG | (address << 2), value])
    }

    fn read_register(&mut self, address: u8) -> Result<u8, SPI::Error> {
        let mut rx = [0u8; 2];
        self.spi.transfer(&mut rx, &[CMD_RREG | (address << 2), DUMMY])?;
        Ok(rx[1])
    }

    /// Reset, then write and read back every configuration register
    ///
    /// Returns whether every register read back as written.
    fn configure(&mut self) -> Result<bool, SPI::Error> {
        self.command(CMD_RESET)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        let mut accepted = true;
        for (address, value) in (0u8..).zip(self.registers) {
            self.write_register(address, value)?;
            self.delay.delay_ms(REGISTER_SETTLE_MS);
            let readback = self.read_register(address)?;
            self.delay.delay_ms(REGISTER_SETTLE_MS);

            if readback != value {
                error!(
                    "ADS1120 REG{} readback {=u8:#x}, expected {=u8:#x}",
                    address,
                    readback,
                    value
                );
                accepted = false;
            }
        }
        Ok(accepted)
    }

    fn route(&mut self, channel: Channel) -> Result<(), SPI::Error> {
        let reg0 = self.registers[REG0 as usize] & 0x0F;
        let reg1 = self.registers[REG1 as usize];
        match channel {
            Channel::Internal => self.write_register(REG1, reg1 | TEMP_SENSOR_MODE),
            Channel::ExternalA => {
                self.write_register(REG1, reg1)?;
                self.write_register(REG0, MUX_AIN0_AIN1 | reg0)
            }
            Channel::ExternalB => {
                self.write_register(REG1, reg1)?;
                self.write_register(REG0, MUX_AIN2_AIN3 | reg0)
            }
        }
    }
}

impl<SPI, DRDY, D> SensorFrontend for Ads1120<SPI, DRDY, D>
where
    SPI: SpiDevice,
    DRDY: InputPin,
    D: DelayNs,
{
    fn variant(&self) -> FrontendVariant {
        FrontendVariant::MuxAdc {
            microvolts_per_count: self.config.microvolts_per_count(),
        }
    }

    fn channels(&self) -> &'static [Channel] {
        &Channel::ALL
    }

    fn init(&mut self) {
        self.converting = false;
        self.timed_out = false;
        self.setup_fault = false;
        self.read_fault = false;

        self.init_fault = match self.configure() {
            Ok(true) => {
                info!("ADS1120 configured");
                false
            }
            Ok(false) => true,
            Err(_) => {
                error!("ADS1120 SPI error during init");
                true
            }
        };
    }

    fn select_channel(&mut self, channel: Channel) {
        // Each channel transaction starts here; only its own setup counts
        self.setup_fault = self.route(channel).is_err();
        if self.setup_fault {
            warn!("ADS1120 SPI error routing {}", channel);
        }
    }

    fn start_conversion(&mut self, now_ms: u32) {
        if self.command(CMD_START_SYNC).is_err() {
            warn!("ADS1120 SPI error on START");
            self.setup_fault = true;
        }
        self.started_at_ms = now_ms;
        self.converting = true;
        self.timed_out = false;
    }

    fn is_ready(&mut self, now_ms: u32) -> bool {
        if !self.converting {
            return false;
        }
        if now_ms.wrapping_sub(self.started_at_ms) > self.config.timeout_ms {
            if !self.timed_out {
                warn!("ADS1120 conversion timed out");
            }
            self.timed_out = true;
            return true;
        }
        // A pin that cannot be read runs into the timeout
        self.drdy.is_low().unwrap_or(false)
    }

    fn read_conversion(&mut self) -> RawFrame {
        if !self.converting {
            return RawFrame::Code16(0);
        }
        if self.timed_out {
            self.converting = false;
            return RawFrame::Code16(0);
        }
        // DRDY still high: nothing valid on DOUT yet
        if !self.drdy.is_low().unwrap_or(false) {
            return RawFrame::Code16(0);
        }
        self.converting = false;

        let mut rx = [0u8; 2];
        match self.spi.transfer(&mut rx, &[DUMMY, DUMMY]) {
            Ok(()) => {
                self.read_fault = false;
                RawFrame::Code16(u16::from_be_bytes(rx))
            }
            Err(_) => {
                warn!("ADS1120 SPI error reading conversion");
                self.read_fault = true;
                RawFrame::Code16(0)
            }
        }
    }

    fn bus_fault(&self) -> bool {
        self.init_fault || self.timed_out || self.setup_fault || self.read_fault
    }
}
