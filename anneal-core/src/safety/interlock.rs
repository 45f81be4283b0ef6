//! Interlock state machine
//!
//! ```text
//!               resume (no standing fault, link live)
//!          ┌──────────────────────────────────┐
//!          │                                  ▼
//!   ┌──────────┐   fault / stop          ┌─────────┐
//!   │ Shutdown │ ◀────────────────────── │  Armed  │
//!   └──────────┘                         └─────────┘
//!     initial
//! ```
//!
//! Faults are re-evaluated on every tick. Shutdown is never left
//! automatically: clearing a fault only makes a later resume possible.

use crate::error::{FaultKind, ResumeRefused};
use crate::heater::{HeaterId, HEATER_COUNT};
use crate::sensor::Reading;
use crate::traits::IndicatorMode;

/// Default supervisory-link timeout
pub const DEFAULT_COMMS_TIMEOUT_MS: u32 = 10_000;

/// Why the heaters are held off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShutdownReason {
    /// Power-on default, waiting to be armed
    Startup,
    /// Stop requested over the supervisory link
    Commanded,
    /// A fault was detected
    Fault(FaultKind),
}

/// Interlock states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterlockState {
    /// Heaters follow their commanded duty
    Armed,
    /// Heaters forced off
    Shutdown(ShutdownReason),
}

/// Inputs to the interlock state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterlockEvent {
    /// A fault condition holds
    FaultDetected(FaultKind),
    /// Supervisor asked to resume (already checked for standing faults)
    Resume,
    /// Supervisor asked to stop
    Stop,
}

impl InterlockState {
    /// Check if heaters may follow commanded duty
    pub fn is_armed(&self) -> bool {
        matches!(self, InterlockState::Armed)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: InterlockEvent) -> Self {
        use InterlockEvent::*;
        use InterlockState::*;

        match (self, event) {
            (Armed, FaultDetected(kind)) => Shutdown(ShutdownReason::Fault(kind)),
            (Armed, Stop) => Shutdown(ShutdownReason::Commanded),
            (Armed, Resume) => Armed,

            // Keep the first fault as the cause
            (Shutdown(ShutdownReason::Fault(first)), FaultDetected(_)) => {
                Shutdown(ShutdownReason::Fault(first))
            }
            (Shutdown(_), FaultDetected(kind)) => Shutdown(ShutdownReason::Fault(kind)),
            (Shutdown(reason), Stop) => Shutdown(reason),
            (Shutdown(_), Resume) => Armed,
        }
    }
}

/// Externally visible safety state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyState {
    /// Heaters forced off
    pub estop: bool,
    /// Supervisory link established and fresh
    pub comms_ok: bool,
    /// Time of the last valid supervisory command
    pub last_valid_rx_ms: u32,
}

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// No fault condition holds
    Ok,
    /// The first fault found this tick
    Fault(FaultKind),
}

/// Snapshot of every fault source for one tick
///
/// The interlock only reads these; it never touches sensor or heater state.
#[derive(Debug, Clone, Copy)]
pub struct FaultInputs<'a> {
    /// Latest reading of every channel
    pub readings: &'a [Reading],
    /// Front end reports an untrusted bus
    pub bus_fault: bool,
    /// Supply sense per heater, in [`HeaterId::ALL`] order
    pub powered: [bool; HEATER_COUNT],
}

/// Safety interlock
#[derive(Debug, Clone)]
pub struct SafetyInterlock {
    state: InterlockState,
    comms_ok: bool,
    last_valid_rx_ms: u32,
    comms_timeout_ms: u32,
    standing: Option<FaultKind>,
}

impl SafetyInterlock {
    /// Create an interlock in the fail-safe Shutdown state
    pub fn new(comms_timeout_ms: u32) -> Self {
        Self {
            state: InterlockState::Shutdown(ShutdownReason::Startup),
            comms_ok: false,
            last_valid_rx_ms: 0,
            comms_timeout_ms,
            standing: None,
        }
    }

    /// Record link freshness as reported by the supervisory layer
    ///
    /// `since_last_valid_ms` is `None` until the first valid command.
    /// A command within the timeout (re)establishes the link; staleness is
    /// detected by [`evaluate`](Self::evaluate).
    pub fn observe_link(&mut self, now_ms: u32, since_last_valid_ms: Option<u32>) {
        let Some(age) = since_last_valid_ms else {
            return;
        };
        if age <= self.comms_timeout_ms {
            if !self.comms_ok {
                info!("supervisory link established");
            }
            self.comms_ok = true;
            self.last_valid_rx_ms = now_ms.wrapping_sub(age);
        }
    }

    /// Re-evaluate every fault source
    ///
    /// Any fault moves the interlock to Shutdown within this call.
    pub fn evaluate(&mut self, inputs: &FaultInputs<'_>, now_ms: u32) -> SafetyStatus {
        let link_stale =
            self.comms_ok && now_ms.wrapping_sub(self.last_valid_rx_ms) > self.comms_timeout_ms;
        if link_stale {
            warn!("supervisory link stale");
            self.comms_ok = false;
        }

        let fault = Self::first_fault(inputs).or(link_stale.then_some(FaultKind::LinkStale));
        self.standing = fault;

        match fault {
            Some(kind) => {
                if self.state.is_armed() {
                    warn!("interlock shutdown: {}", kind);
                }
                self.state = self.state.transition(InterlockEvent::FaultDetected(kind));
                SafetyStatus::Fault(kind)
            }
            None => SafetyStatus::Ok,
        }
    }

    /// Explicit resume from the supervisory layer
    ///
    /// Refused while any fault from the last evaluation still stands, and
    /// while the supervisory link is down: arming without a live link would
    /// leave the heaters with no link watchdog.
    pub fn resume(&mut self) -> Result<(), ResumeRefused> {
        if let Some(kind) = self.standing {
            warn!("resume refused: {}", kind);
            return Err(ResumeRefused(kind));
        }
        if !self.comms_ok {
            warn!("resume refused: no supervisory link");
            return Err(ResumeRefused(FaultKind::LinkStale));
        }
        if !self.state.is_armed() {
            info!("interlock armed");
        }
        self.state = self.state.transition(InterlockEvent::Resume);
        Ok(())
    }

    /// Explicit stop from the supervisory layer
    pub fn stop(&mut self) {
        if self.state.is_armed() {
            warn!("interlock shutdown: commanded");
        }
        self.state = self.state.transition(InterlockEvent::Stop);
    }

    /// Current state
    pub fn state(&self) -> InterlockState {
        self.state
    }

    /// Check if heaters may follow commanded duty
    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }

    /// Fault found by the last evaluation, if any
    pub fn standing_fault(&self) -> Option<FaultKind> {
        self.standing
    }

    /// Estop and link state for reporting
    pub fn safety_state(&self) -> SafetyState {
        SafetyState {
            estop: !self.state.is_armed(),
            comms_ok: self.comms_ok,
            last_valid_rx_ms: self.last_valid_rx_ms,
        }
    }

    /// Error indicator mode for the current state
    pub fn indicator_mode(&self) -> IndicatorMode {
        let fault_shutdown = matches!(
            self.state,
            InterlockState::Shutdown(ShutdownReason::Fault(_))
        );
        if self.standing.is_some() || fault_shutdown {
            IndicatorMode::Fast
        } else if !self.comms_ok {
            IndicatorMode::Slow
        } else {
            IndicatorMode::Off
        }
    }

    fn first_fault(inputs: &FaultInputs<'_>) -> Option<FaultKind> {
        if inputs.bus_fault {
            return Some(FaultKind::Bus);
        }

        let sensor = inputs
            .readings
            .iter()
            .find_map(|r| FaultKind::from_flags(r.channel, r.fault_flags));
        if sensor.is_some() {
            return sensor;
        }

        HeaterId::ALL
            .iter()
            .find(|id| !inputs.powered[id.index()])
            .map(|&id| FaultKind::Power(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RangeKind;
    use crate::sensor::{Channel, FaultFlags};

    fn clean_readings() -> [Reading; 3] {
        Channel::ALL.map(Reading::empty)
    }

    fn inputs(readings: &[Reading]) -> FaultInputs<'_> {
        FaultInputs {
            readings,
            bus_fault: false,
            powered: [true, true],
        }
    }

    fn armed() -> SafetyInterlock {
        let mut interlock = SafetyInterlock::new(DEFAULT_COMMS_TIMEOUT_MS);
        interlock.observe_link(0, Some(0));
        let readings = clean_readings();
        assert_eq!(interlock.evaluate(&inputs(&readings), 0), SafetyStatus::Ok);
        interlock.resume().unwrap();
        interlock
    }

    #[test]
    fn test_starts_in_shutdown() {
        let interlock = SafetyInterlock::new(DEFAULT_COMMS_TIMEOUT_MS);
        assert_eq!(
            interlock.state(),
            InterlockState::Shutdown(ShutdownReason::Startup)
        );
        assert!(interlock.safety_state().estop);
        assert!(!interlock.safety_state().comms_ok);
        assert_eq!(interlock.indicator_mode(), IndicatorMode::Slow);
    }

    #[test]
    fn test_resume_arms_without_faults() {
        let interlock = armed();
        assert!(interlock.is_armed());
        assert!(!interlock.safety_state().estop);
        assert_eq!(interlock.indicator_mode(), IndicatorMode::Off);
    }

    #[test]
    fn test_power_loss_shuts_down() {
        let mut interlock = armed();
        let readings = clean_readings();
        let mut snapshot = inputs(&readings);
        snapshot.powered = [true, false];

        assert_eq!(
            interlock.evaluate(&snapshot, 100),
            SafetyStatus::Fault(FaultKind::Power(HeaterId::B))
        );
        assert_eq!(
            interlock.state(),
            InterlockState::Shutdown(ShutdownReason::Fault(FaultKind::Power(HeaterId::B)))
        );
        assert_eq!(interlock.indicator_mode(), IndicatorMode::Fast);
    }

    #[test]
    fn test_reading_fault_shuts_down() {
        let mut interlock = armed();
        let mut readings = clean_readings();
        readings[2].fault_flags = FaultFlags::EXTERNAL_RANGE;

        assert_eq!(
            interlock.evaluate(&inputs(&readings), 100),
            SafetyStatus::Fault(FaultKind::Range(Channel::ExternalB, RangeKind::External))
        );
        assert!(!interlock.is_armed());
    }

    #[test]
    fn test_no_auto_clear() {
        let mut interlock = armed();
        let readings = clean_readings();
        let mut snapshot = inputs(&readings);
        snapshot.bus_fault = true;
        interlock.evaluate(&snapshot, 100);

        // Fault clears, interlock stays down until resumed
        snapshot.bus_fault = false;
        assert_eq!(interlock.evaluate(&snapshot, 200), SafetyStatus::Ok);
        assert!(!interlock.is_armed());
        assert_eq!(
            interlock.state(),
            InterlockState::Shutdown(ShutdownReason::Fault(FaultKind::Bus))
        );

        interlock.resume().unwrap();
        assert!(interlock.is_armed());
    }

    #[test]
    fn test_resume_refused_while_fault_stands() {
        let mut interlock = armed();
        let readings = clean_readings();
        let mut snapshot = inputs(&readings);
        snapshot.powered = [false, true];
        interlock.evaluate(&snapshot, 100);

        assert_eq!(
            interlock.resume(),
            Err(ResumeRefused(FaultKind::Power(HeaterId::A)))
        );
        assert!(!interlock.is_armed());
    }

    #[test]
    fn test_resume_refused_without_link() {
        let mut interlock = SafetyInterlock::new(DEFAULT_COMMS_TIMEOUT_MS);
        let readings = clean_readings();
        interlock.observe_link(0, None);
        assert_eq!(interlock.evaluate(&inputs(&readings), 0), SafetyStatus::Ok);

        assert_eq!(interlock.resume(), Err(ResumeRefused(FaultKind::LinkStale)));
        assert_eq!(
            interlock.state(),
            InterlockState::Shutdown(ShutdownReason::Startup)
        );
    }

    #[test]
    fn test_resume_refused_after_link_went_stale() {
        let mut interlock = SafetyInterlock::new(1000);
        let readings = clean_readings();
        interlock.observe_link(0, Some(0));
        interlock.evaluate(&inputs(&readings), 2000);
        // Edge already reported, nothing stands any more
        assert_eq!(interlock.evaluate(&inputs(&readings), 2100), SafetyStatus::Ok);

        assert_eq!(interlock.resume(), Err(ResumeRefused(FaultKind::LinkStale)));
        assert!(!interlock.is_armed());

        // A fresh command re-establishes the link and arming works again
        interlock.observe_link(2200, Some(0));
        assert_eq!(interlock.evaluate(&inputs(&readings), 2200), SafetyStatus::Ok);
        assert_eq!(interlock.resume(), Ok(()));
        assert!(interlock.is_armed());
    }

    #[test]
    fn test_link_timeout() {
        let mut interlock = armed();
        let readings = clean_readings();

        interlock.observe_link(10_000, Some(10_000));
        assert_eq!(interlock.evaluate(&inputs(&readings), 10_000), SafetyStatus::Ok);
        assert!(interlock.is_armed());

        interlock.observe_link(10_001, Some(10_001));
        assert_eq!(
            interlock.evaluate(&inputs(&readings), 10_001),
            SafetyStatus::Fault(FaultKind::LinkStale)
        );
        assert!(!interlock.is_armed());
        assert!(!interlock.safety_state().comms_ok);

        // Staleness is an edge: once comms_ok drops it no longer stands
        assert_eq!(interlock.evaluate(&inputs(&readings), 10_100), SafetyStatus::Ok);
        assert_eq!(interlock.indicator_mode(), IndicatorMode::Fast);
    }

    #[test]
    fn test_link_never_established_is_not_stale() {
        let mut interlock = SafetyInterlock::new(1000);
        let readings = clean_readings();
        interlock.observe_link(50_000, None);
        assert_eq!(interlock.evaluate(&inputs(&readings), 50_000), SafetyStatus::Ok);
        assert!(!interlock.safety_state().comms_ok);
    }

    #[test]
    fn test_fresh_command_restores_link() {
        let mut interlock = SafetyInterlock::new(1000);
        let readings = clean_readings();
        interlock.observe_link(0, Some(0));
        interlock.evaluate(&inputs(&readings), 2000);
        assert!(!interlock.safety_state().comms_ok);

        interlock.observe_link(3000, Some(5));
        assert!(interlock.safety_state().comms_ok);
        assert_eq!(interlock.safety_state().last_valid_rx_ms, 2995);
    }

    #[test]
    fn test_stop_command() {
        let mut interlock = armed();
        interlock.stop();
        assert_eq!(
            interlock.state(),
            InterlockState::Shutdown(ShutdownReason::Commanded)
        );
        assert_eq!(interlock.indicator_mode(), IndicatorMode::Off);
    }

    #[test]
    fn test_first_fault_cause_is_kept() {
        let state = InterlockState::Armed
            .transition(InterlockEvent::FaultDetected(FaultKind::Bus))
            .transition(InterlockEvent::FaultDetected(FaultKind::LinkStale));
        assert_eq!(
            state,
            InterlockState::Shutdown(ShutdownReason::Fault(FaultKind::Bus))
        );
    }
}
