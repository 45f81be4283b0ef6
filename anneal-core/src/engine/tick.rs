//! One engine pass
//!
//! Order within a tick:
//!
//! 1. advance acquisition by at most one channel
//! 2. sample heater supply sense
//! 3. observe the supervisory link
//! 4. evaluate every fault source
//! 5. apply resume/stop requests
//! 6. run the controller on a completed round (armed only)
//! 7. drive the heater outputs for this point in the period
//! 8. push the error indicator mode if it changed
//!
//! Evaluation precedes every output write, so a fault seen in this tick
//! already holds the heaters off in this tick.

use crate::config::EngineConfig;
use crate::error::{ConfigError, ResumeRefused};
use crate::heater::{duty_from_f32, HeaterChannel, HeaterId, HEATER_COUNT};
use crate::safety::{FaultInputs, SafetyInterlock, SafetyStatus};
use crate::scheduler::{AcquisitionScheduler, RoundStatus};
use crate::sensor::{Channel, Reading};
use crate::traits::{
    ClosedLoopController, ErrorIndicator, HeaterOutput, IndicatorMode, SensorFrontend,
    SupervisoryLink,
};

use super::telemetry::Telemetry;

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Acquisition progress
    pub round: RoundStatus,
    /// Safety evaluation result
    pub status: SafetyStatus,
    /// Outcome of a resume request, if one was taken this tick
    pub resume: Option<Result<(), ResumeRefused>>,
    /// Output state written to each heater
    pub heater_on: [bool; HEATER_COUNT],
    /// Round snapshot, on completed rounds only
    pub telemetry: Option<Telemetry>,
}

/// Acquisition and safety engine
pub struct Engine<F, H> {
    scheduler: AcquisitionScheduler<F>,
    heaters: [HeaterChannel<H>; HEATER_COUNT],
    interlock: SafetyInterlock,
    indicator_mode: Option<IndicatorMode>,
}

impl<F: SensorFrontend, H: HeaterOutput> Engine<F, H> {
    /// Create an engine with both heaters off and the interlock shut down
    pub fn new(
        frontend: F,
        heaters: [H; HEATER_COUNT],
        config: &EngineConfig,
    ) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("engine config rejected: {}", e);
            return Err(e);
        }

        let decoder = config.decoder_for(frontend.variant());
        let scheduler =
            AcquisitionScheduler::new(frontend, decoder, config.period_ms, config.channel_gap_ms);
        let heaters = heaters.map(|output| HeaterChannel::new(output, config.period_ms));

        Ok(Self {
            scheduler,
            heaters,
            interlock: SafetyInterlock::new(config.comms_timeout_ms),
            indicator_mode: None,
        })
    }

    /// Initialize the front end and anchor timing at `now_ms`
    pub fn start(&mut self, now_ms: u32) {
        info!("engine start at {} ms", now_ms);
        self.scheduler.start(now_ms);
    }

    /// Run one non-blocking pass
    pub fn tick<C, L, I>(
        &mut self,
        now_ms: u32,
        controller: &mut C,
        link: &mut L,
        indicator: &mut I,
    ) -> TickOutcome
    where
        C: ClosedLoopController,
        L: SupervisoryLink,
        I: ErrorIndicator,
    {
        let round = self.scheduler.advance(now_ms);

        let mut powered = [false; HEATER_COUNT];
        for (sensed, heater) in powered.iter_mut().zip(self.heaters.iter_mut()) {
            *sensed = heater.sample_power();
        }

        self.interlock
            .observe_link(now_ms, link.time_since_last_valid_command());
        let inputs = FaultInputs {
            readings: self.scheduler.readings(),
            bus_fault: self.scheduler.bus_fault(),
            powered,
        };
        let status = self.interlock.evaluate(&inputs, now_ms);

        let resume = if link.take_resume() {
            Some(self.interlock.resume())
        } else {
            None
        };
        if link.take_stop() {
            self.interlock.stop();
        }

        if self.interlock.is_armed() {
            if round == RoundStatus::RoundComplete {
                self.run_controller(controller);
            }
        } else {
            for heater in self.heaters.iter_mut() {
                heater.force_shutdown();
            }
        }

        let elapsed = self.scheduler.elapsed_in_period(now_ms);
        let mut heater_on = [false; HEATER_COUNT];
        for (on, heater) in heater_on.iter_mut().zip(self.heaters.iter_mut()) {
            *on = heater.update(elapsed);
        }

        let mode = self.interlock.indicator_mode();
        if self.indicator_mode != Some(mode) {
            indicator.set_mode(mode);
            self.indicator_mode = Some(mode);
        }

        let telemetry = match round {
            RoundStatus::RoundComplete => Some(self.telemetry(now_ms, powered)),
            RoundStatus::Pending => None,
        };

        TickOutcome {
            round,
            status,
            resume,
            heater_on,
            telemetry,
        }
    }

    /// Latest reading of `channel`
    pub fn reading(&self, channel: Channel) -> Option<&Reading> {
        self.scheduler.reading(channel)
    }

    /// Heater channel `id`
    pub fn heater(&self, id: HeaterId) -> &HeaterChannel<H> {
        &self.heaters[id.index()]
    }

    /// Safety interlock
    pub fn interlock(&self) -> &SafetyInterlock {
        &self.interlock
    }

    /// Acquisition scheduler
    pub fn scheduler(&self) -> &AcquisitionScheduler<F> {
        &self.scheduler
    }

    /// Acquisition scheduler, mutably (front-end access for tests and bring-up)
    pub fn scheduler_mut(&mut self) -> &mut AcquisitionScheduler<F> {
        &mut self.scheduler
    }

    fn run_controller<C: ClosedLoopController>(&mut self, controller: &mut C) {
        let reading_a = self.controller_input(HeaterId::A);
        let reading_b = self.controller_input(HeaterId::B);
        let (duty_a, duty_b) = controller.compute(&reading_a, &reading_b);

        let duties = [duty_from_f32(duty_a), duty_from_f32(duty_b)];
        for (heater, duty) in self.heaters.iter_mut().zip(duties) {
            heater.set_duty(duty);
        }
        debug!("duty A={}% B={}%", duties[0], duties[1]);
    }

    fn controller_input(&self, id: HeaterId) -> Reading {
        let channel = id.channel();
        self.scheduler
            .reading(channel)
            .copied()
            .unwrap_or(Reading::empty(channel))
    }

    fn telemetry(&self, now_ms: u32, powered: [bool; HEATER_COUNT]) -> Telemetry {
        let cursor = self.scheduler.cursor();
        Telemetry {
            round: cursor.rounds,
            timestamp_ms: now_ms,
            readings: self.scheduler.readings().iter().copied().collect(),
            duty_percent: [
                self.heaters[HeaterId::A.index()].duty_percent(),
                self.heaters[HeaterId::B.index()].duty_percent(),
            ],
            powered,
            bus_fault: self.scheduler.bus_fault(),
            interlock: self.interlock.state(),
            safety: self.interlock.safety_state(),
            overruns: cursor.overruns,
        }
    }
}
