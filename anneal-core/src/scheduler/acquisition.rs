//! Non-blocking acquisition state machine
//!
//! Once per round period the scheduler walks the front end's channel list
//! in order:
//!
//! ```text
//!  period rolls    ready        gap elapsed   ready        ...  last ready
//! Idle ──────▶ Converting(0) ──▶ Settling(1) ──▶ Converting(1) ──▶ ... ──▶ Idle
//!                                                                  RoundComplete
//! ```
//!
//! Every call advances at most one channel. The scheduler is the only
//! caller of the front end, so the bus never sees two channel transactions
//! at once.

use heapless::Vec;

use crate::sensor::{Channel, Decoder, FaultFlags, Reading, MAX_CHANNELS};
use crate::traits::SensorFrontend;

/// Outcome of one scheduler step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoundStatus {
    /// Round still in progress, or waiting for the next period
    Pending,
    /// The last channel of the round was read on this call
    RoundComplete,
}

/// Where the cursor is within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting for the next period to begin
    Idle,
    /// Conversion in flight on the channel at this position
    Converting(usize),
    /// Waiting out the minimum gap before starting this position
    Settling(usize),
}

/// Scheduler-owned timing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionCursor {
    /// Current phase
    pub phase: Phase,
    /// When the current period started
    pub period_start_ms: u32,
    /// When the most recent channel conversion started
    pub channel_start_ms: u32,
    /// Channels completed in the current round
    pub completed: usize,
    /// Rounds completed since start
    pub rounds: u32,
    /// Periods that rolled over while a round was still in progress
    pub overruns: u32,
}

impl AcquisitionCursor {
    const fn new(now_ms: u32) -> Self {
        Self {
            phase: Phase::Idle,
            period_start_ms: now_ms,
            channel_start_ms: now_ms,
            completed: 0,
            rounds: 0,
            overruns: 0,
        }
    }
}

/// Acquisition scheduler
///
/// Owns the front end, the cursor and the per-channel reading slots.
pub struct AcquisitionScheduler<F> {
    frontend: F,
    decoder: Decoder,
    order: &'static [Channel],
    readings: Vec<Reading, MAX_CHANNELS>,
    period_ms: u32,
    gap_ms: u32,
    cursor: AcquisitionCursor,
}

impl<F: SensorFrontend> AcquisitionScheduler<F> {
    /// Create a scheduler
    ///
    /// The decoder should match the front end's variant. The first round
    /// starts one full period after `start` is called.
    pub fn new(frontend: F, decoder: Decoder, period_ms: u32, gap_ms: u32) -> Self {
        let order = frontend.channels();
        let order = &order[..order.len().min(MAX_CHANNELS)];
        let readings = order.iter().map(|&ch| Reading::empty(ch)).collect();

        Self {
            frontend,
            decoder,
            order,
            readings,
            period_ms,
            gap_ms,
            cursor: AcquisitionCursor::new(0),
        }
    }

    /// Initialize the front end and anchor the first period at `now_ms`
    ///
    /// This is the only call that may block (front-end settling delays).
    pub fn start(&mut self, now_ms: u32) {
        self.frontend.init();
        if self.frontend.bus_fault() {
            error!("front end rejected its configuration");
        }
        self.cursor = AcquisitionCursor::new(now_ms);
    }

    /// Advance the state machine by at most one channel
    ///
    /// Returns [`RoundStatus::RoundComplete`] exactly once per round, on the
    /// call where the last channel's reading becomes available.
    pub fn advance(&mut self, now_ms: u32) -> RoundStatus {
        let period_rolled = self.elapsed_in_period(now_ms) >= self.period_ms;
        if period_rolled {
            self.cursor.period_start_ms = now_ms;
            if self.cursor.phase != Phase::Idle {
                self.cursor.overruns = self.cursor.overruns.wrapping_add(1);
                warn!("acquisition round overran its period");
            }
        }

        match self.cursor.phase {
            Phase::Idle => {
                if period_rolled && !self.order.is_empty() {
                    self.cursor.completed = 0;
                    self.begin(0, now_ms);
                }
                RoundStatus::Pending
            }
            Phase::Converting(index) => {
                if !self.frontend.is_ready(now_ms) {
                    return RoundStatus::Pending;
                }
                self.collect(index);

                let next = index + 1;
                if next >= self.order.len() {
                    self.cursor.phase = Phase::Idle;
                    self.cursor.rounds = self.cursor.rounds.wrapping_add(1);
                    return RoundStatus::RoundComplete;
                }

                if self.gap_elapsed(now_ms) {
                    self.begin(next, now_ms);
                } else {
                    self.cursor.phase = Phase::Settling(next);
                }
                RoundStatus::Pending
            }
            Phase::Settling(index) => {
                if self.gap_elapsed(now_ms) {
                    self.begin(index, now_ms);
                }
                RoundStatus::Pending
            }
        }
    }

    /// Time since the current period started
    pub fn elapsed_in_period(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.cursor.period_start_ms)
    }

    /// Latest reading for `channel`, if this front end services it
    pub fn reading(&self, channel: Channel) -> Option<&Reading> {
        self.readings.iter().find(|r| r.channel == channel)
    }

    /// Latest readings in read order
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Channel read order
    pub fn order(&self) -> &'static [Channel] {
        self.order
    }

    /// Check if the front end reports an untrusted bus
    pub fn bus_fault(&self) -> bool {
        self.frontend.bus_fault()
    }

    /// Timing state
    pub fn cursor(&self) -> &AcquisitionCursor {
        &self.cursor
    }

    /// Decoder in use
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Underlying front end
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Underlying front end, mutably
    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    fn gap_elapsed(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.cursor.channel_start_ms) >= self.gap_ms
    }

    fn begin(&mut self, index: usize, now_ms: u32) {
        let channel = self.order[index];
        self.frontend.select_channel(channel);
        self.frontend.start_conversion(now_ms);
        self.cursor.channel_start_ms = now_ms;
        self.cursor.phase = Phase::Converting(index);
        trace!("conversion started on {}", channel);
    }

    fn collect(&mut self, index: usize) {
        let channel = self.order[index];
        let frame = self.frontend.read_conversion();
        let cold_junction_c = self
            .reading(Channel::Internal)
            .map_or(0.0, |r| r.internal_temp_c);

        let mut reading = self.decoder.decode(channel, frame, cold_junction_c);
        if self.frontend.bus_fault() {
            reading.fault_flags.insert(FaultFlags::BUS);
        }
        if reading.is_faulted() {
            debug!("fault on {}: {}", channel, reading.fault_flags);
        }

        self.readings[index] = reading;
        self.cursor.completed = index + 1;
    }
}
