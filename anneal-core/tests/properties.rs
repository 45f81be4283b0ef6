//! Property tests for the timing and decoding invariants.
//!
//! Host only.

use anneal_core::heater::{duty_from_f32, on_time_ms, HeaterChannel};
use anneal_core::safety::{FaultInputs, SafetyInterlock, SafetyStatus};
use anneal_core::scheduler::{AcquisitionScheduler, RoundStatus};
use anneal_core::sensor::{
    Channel, ChipFrame, Decoder, FaultFlags, FrontendVariant, RawFrame, Reading,
};
use anneal_core::traits::{HeaterOutput, SensorFrontend};
use proptest::prelude::*;

// ── Heater duty ──────────────────────────────────────────────

struct Output {
    on: bool,
}

impl HeaterOutput for Output {
    fn set_on(&mut self, on: bool) {
        self.on = on;
    }
    fn is_on(&self) -> bool {
        self.on
    }
    fn sense_power(&mut self) -> bool {
        true
    }
}

proptest! {
    /// The output is on exactly for the first on-time of each period,
    /// and the on-time is the duty share of the period rounded to the ms.
    #[test]
    fn heater_on_for_duty_share(
        period in 1u32..=10_000,
        duty in 0u8..=100,
        frac in 0.0f64..1.0,
    ) {
        let elapsed = (f64::from(period) * frac) as u32;
        let mut heater = HeaterChannel::new(Output { on: true }, period);
        heater.set_duty(duty);

        let expected_on_time = (f64::from(period) * f64::from(duty) / 100.0).round() as u32;
        prop_assert_eq!(heater.on_time_ms(), expected_on_time);
        prop_assert_eq!(on_time_ms(period, duty), expected_on_time);

        let on = heater.update(elapsed);
        let expected = match duty {
            0 => false,
            100 => true,
            _ => elapsed < heater.on_time_ms(),
        };
        prop_assert_eq!(on, expected);
        prop_assert_eq!(heater.is_on(), expected);
    }

    /// Oversized duties clamp to 100 %.
    #[test]
    fn heater_duty_clamped(duty in 101u8..=255) {
        let mut heater = HeaterChannel::new(Output { on: false }, 1000);
        heater.set_duty(duty);
        prop_assert_eq!(heater.duty_percent(), 100);
        prop_assert!(heater.update(999));
    }

    /// Any controller output maps into 0..=100.
    #[test]
    fn duty_conversion_in_range(raw in proptest::num::f32::ANY) {
        let duty = duty_from_f32(raw);
        prop_assert!(duty <= 100);
        if raw.is_nan() || raw <= 0.0 {
            prop_assert_eq!(duty, 0);
        }
    }
}

// ── 32-bit chip frames ───────────────────────────────────────

proptest! {
    /// Encoding then decoding a chip frame recovers both temperatures
    /// to within one LSB.
    #[test]
    fn chip_frame_within_one_lsb(
        internal in -127.0f32..127.0,
        external in -2000.0f32..2000.0,
    ) {
        let word = ChipFrame::from_celsius(internal, external).encode();
        let frame = ChipFrame::decode(word);

        prop_assert!((frame.internal_c() - internal).abs() <= 0.0625);
        prop_assert!((frame.external_c() - external).abs() <= 0.25);
        prop_assert!(!frame.fault);
        prop_assert!(frame.probe_faults().is_empty());
    }

    /// A chip frame carrying a probe status bit never yields a temperature.
    #[test]
    fn chip_probe_fault_suppresses_temperature(status in 1u32..=7) {
        let word = ChipFrame::from_celsius(22.0, 20.0).encode() | (1 << 16) | status;
        let decoder = Decoder::new(FrontendVariant::ShiftChip);
        let reading = decoder.decode(Channel::ExternalA, RawFrame::Chip32(word), 0.0);

        prop_assert!(reading.fault_flags.intersects(FaultFlags::PROBE));
        prop_assert_eq!(reading.external_temp_corrected_c, 0.0);
    }
}

// ── Acquisition order and spacing ────────────────────────────

const INTERNAL_22C: u16 = 704 << 2;

/// Records every conversion start; ready a fixed delay later
struct Recorder {
    delay_ms: u32,
    selected: Channel,
    started_at: u32,
    starts: Vec<(Channel, u32)>,
}

impl SensorFrontend for Recorder {
    fn variant(&self) -> FrontendVariant {
        FrontendVariant::MuxAdc {
            microvolts_per_count: 0.488_281_25,
        }
    }
    fn channels(&self) -> &'static [Channel] {
        &Channel::ALL
    }
    fn init(&mut self) {}
    fn select_channel(&mut self, channel: Channel) {
        self.selected = channel;
    }
    fn start_conversion(&mut self, now_ms: u32) {
        self.started_at = now_ms;
        self.starts.push((self.selected, now_ms));
    }
    fn is_ready(&mut self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.started_at) >= self.delay_ms
    }
    fn read_conversion(&mut self) -> RawFrame {
        match self.selected {
            Channel::Internal => RawFrame::Code16(INTERNAL_22C),
            _ => RawFrame::Code16(0x0010),
        }
    }
    fn bus_fault(&self) -> bool {
        false
    }
}

proptest! {
    /// Channels are read in fixed order, one at a time, with successive
    /// starts at least the gap apart, and each round reports completion once.
    #[test]
    fn scheduler_order_and_gap(
        delay_ms in 0u32..=150,
        gap_ms in 0u32..=200,
        steps in proptest::collection::vec(1u32..=40, 50..400),
    ) {
        let frontend = Recorder {
            delay_ms,
            selected: Channel::Internal,
            started_at: 0,
            starts: Vec::new(),
        };
        let decoder = Decoder::new(frontend.variant());
        let mut scheduler = AcquisitionScheduler::new(frontend, decoder, 1000, gap_ms);
        scheduler.start(0);

        let mut now = 0u32;
        let mut completions = 0u32;
        for step in steps {
            now += step;
            if scheduler.advance(now) == RoundStatus::RoundComplete {
                completions += 1;
            }
        }

        let starts = &scheduler.frontend().starts;
        for (i, (channel, _)) in starts.iter().enumerate() {
            prop_assert_eq!(*channel, Channel::ALL[i % 3]);
        }
        for pair in starts.windows(2) {
            let gap = pair[1].1 - pair[0].1;
            prop_assert!(gap >= gap_ms);
            prop_assert!(gap >= delay_ms);
        }
        prop_assert_eq!(completions, scheduler.cursor().rounds);
        prop_assert_eq!(scheduler.cursor().overruns, 0);
        prop_assert!(completions as usize <= starts.len() / 3);
    }
}

// ── Interlock ────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Resume,
    Stop,
    Evaluate { bus: bool, flags: u16, power: [bool; 2] },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Resume),
        Just(Op::Stop),
        (any::<bool>(), 0u16..0x200, any::<[bool; 2]>())
            .prop_map(|(bus, flags, power)| Op::Evaluate { bus, flags, power }),
    ]
}

proptest! {
    /// The interlock is never armed while a fault stands.
    #[test]
    fn interlock_never_armed_with_standing_fault(
        ops in proptest::collection::vec(arb_op(), 1..64),
    ) {
        let mut interlock = SafetyInterlock::new(10_000);
        interlock.observe_link(0, Some(0));
        let mut readings = Channel::ALL.map(Reading::empty);

        for op in ops {
            match op {
                Op::Resume => {
                    let standing = interlock.standing_fault();
                    prop_assert_eq!(interlock.resume().is_ok(), standing.is_none());
                }
                Op::Stop => {
                    interlock.stop();
                    prop_assert!(!interlock.is_armed());
                }
                Op::Evaluate { bus, flags, power } => {
                    readings[1].fault_flags = FaultFlags::from_bits_truncate(flags);
                    let inputs = FaultInputs {
                        readings: &readings,
                        bus_fault: bus,
                        powered: power,
                    };
                    let status = interlock.evaluate(&inputs, 0);

                    let faulted = bus || flags != 0 || !power[0] || !power[1];
                    prop_assert_eq!(status != SafetyStatus::Ok, faulted);
                    if faulted {
                        prop_assert!(!interlock.is_armed());
                    }
                }
            }
            if interlock.standing_fault().is_some() {
                prop_assert!(!interlock.is_armed());
            }
        }
    }
}
