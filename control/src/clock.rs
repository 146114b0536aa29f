//! The whole clock divider wired together.
//!
//! The firmware owns a single `Clock` in its control loop and a single
//! `Edges` shared with the interrupt handlers. On every tick of the loop it
//! passes both, together with a fresh snapshot of analog inputs, to
//! `Clock::tick` and writes the returned `DesiredOutput` to the gate pins.

use crate::capture::{Capture, Edges};
use crate::config::Config;
use crate::error::ConfigurationError;
use crate::estimator::{Estimate, PeriodEstimator, StableClock, QUEUE_SIZE};
use crate::generator::Generator;
use crate::gesture::{Gesture, ResetGesture};
use crate::input::{Snapshot, Store};
use crate::internal_clock::{InternalClock, Tempo};
use crate::log;
use crate::mode::{Engaged, Mode};
use crate::output::DesiredOutput;
use crate::time::{self, Instant};

const REPORT_INTERVAL: u32 = 1_000_000;

/// Clock divider and multiplier.
///
/// `N` is the number of intervals averaged by the period estimator.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clock<const N: usize = QUEUE_SIZE> {
    config: Config,
    mode: Mode,
    estimator: PeriodEstimator<N>,
    internal: InternalClock,
    internal_tempo: Tempo,
    gesture: ResetGesture,
    generator: Generator,
    inputs: Store,
    waiting_for_clock_input: bool,
    diagnostics: Diagnostics,
    last_report: Option<Instant>,
}

/// Counters useful for debugging of the module.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub clock_edges: u32,
    pub reset_edges: u32,
    pub overruns: u32,
    pub loops: u32,
}

impl<const N: usize> Clock<N> {
    /// # Errors
    ///
    /// Fails if the configuration does not pass `Config::validate`.
    pub fn new(config: Config) -> Result<Self, ConfigurationError> {
        if let Err(error) = config.validate() {
            log::warning!("Rejected configuration: {}", error);
            return Err(error);
        }
        let internal_tempo = Tempo::new(config.internal_bpm)?;
        Ok(Self {
            config,
            mode: Mode::default(),
            estimator: PeriodEstimator::new(config.bpm_change_threshold),
            internal: InternalClock::new(internal_tempo),
            internal_tempo,
            gesture: ResetGesture::new(
                config.long_press.to_micros(),
                config.reset_debounce.to_micros(),
            ),
            generator: Generator::new(
                config.gate_modes,
                config.downbeat_mode,
                config.clock_trig.to_micros(),
            ),
            inputs: Store::default(),
            waiting_for_clock_input: true,
            diagnostics: Diagnostics::default(),
            last_report: None,
        })
    }

    /// Run one iteration of the control loop.
    pub fn tick(&mut self, now: Instant, edges: &Edges, snapshot: Snapshot) -> DesiredOutput {
        let mut capture = edges.take();
        self.waiting_for_clock_input = capture.waiting_for_clock_input;
        self.update_diagnostics(&capture);

        match self.gesture.update(capture.reset, now) {
            Some(Gesture::Reset(at)) => {
                log::debug!("Resetting phase of outputs");
                self.generator.reset(at, now, self.estimator.last_edge());
            }
            Some(Gesture::Toggle) => {
                self.toggle_mode(now, edges);
                if self.mode.is_external() {
                    capture.pending.clear();
                }
            }
            None => (),
        }

        self.apply_silence_policy(now, &capture);

        if self.mode.is_external() {
            for edge in &capture.pending {
                self.feed(*edge);
            }
        } else {
            while let Some(pulse) = self.internal.tick(now) {
                self.feed(pulse);
            }
        }

        self.inputs.update(snapshot);
        self.reconcile_inputs();

        let output = self.generator.tick(now, self.stable_clock());
        self.report(now);
        output
    }

    fn feed(&mut self, edge: Instant) {
        if let Some(Estimate::Published(_)) = self.estimator.feed(edge) {
            self.mode = self.mode.lock();
        }
    }

    fn toggle_mode(&mut self, now: Instant, edges: &Edges) {
        self.mode = self.mode.toggle();
        if self.mode.is_internal() {
            self.internal.set_tempo(self.internal_tempo);
            self.enter_internal(now);
        } else {
            self.leave_internal();
            edges.rearm();
            self.waiting_for_clock_input = true;
        }
    }

    fn apply_silence_policy(&mut self, now: Instant, capture: &Capture) {
        match self.mode {
            Mode::ExternalLocked => {
                let (Some(periods), Some(stable), Some(last_edge)) = (
                    self.config.silence_fallback,
                    self.estimator.stable(),
                    capture.last_clock_edge,
                ) else {
                    return;
                };
                let silence = stable.period.saturating_mul(periods).min(u32::MAX / 4);
                let deadline = last_edge.wrapping_add(silence);
                if time::reached(now, deadline) {
                    self.mode = self.mode.fall_back();
                    let tempo = Tempo::new(stable.bpm).unwrap_or(self.internal_tempo);
                    self.internal.set_tempo(tempo);
                    self.enter_internal(now);
                }
            }
            Mode::Internal(Engaged::Silence) if !capture.pending.is_empty() => {
                self.mode = self.mode.resume();
                self.leave_internal();
            }
            _ => (),
        }
    }

    fn enter_internal(&mut self, now: Instant) {
        self.estimator.restart();
        self.internal.start(now);
    }

    fn leave_internal(&mut self) {
        self.internal.stop();
        self.estimator.reset();
    }

    fn reconcile_inputs(&mut self) {
        for (i, ratio) in self.inputs.ratios().into_iter().enumerate() {
            self.generator.set_ratio(i, ratio);
        }
        let beats = self.inputs.beats_per_bar();
        if self.generator.set_beats_per_bar(beats).is_err() {
            log::warning!("Ignoring unsupported bar length {=u8}", beats);
        }
    }

    fn update_diagnostics(&mut self, capture: &Capture) {
        self.diagnostics.clock_edges = capture.clock_edges;
        self.diagnostics.reset_edges = capture.reset_edges;
        if capture.overruns != self.diagnostics.overruns {
            log::warning!("Clock edges overran the pending buffer");
        }
        self.diagnostics.overruns = capture.overruns;
        self.diagnostics.loops = self.diagnostics.loops.wrapping_add(1);
    }

    fn report(&mut self, now: Instant) {
        let due = self
            .last_report
            .map_or(true, |last| time::elapsed(now, last) >= REPORT_INTERVAL);
        if due {
            self.last_report = Some(now);
            log::debug!("{} {} {}", self.mode, self.stable_clock(), self.diagnostics);
        }
    }

    /// Currently used tempo, `None` if there is no clock to follow.
    pub fn stable_clock(&self) -> Option<StableClock> {
        self.estimator.stable()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn waiting_for_clock_input(&self) -> bool {
        self.waiting_for_clock_input
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn inputs(&self) -> &Store {
        &self.inputs
    }

    pub fn internal_bpm(&self) -> f32 {
        self.internal.tempo().bpm()
    }

    /// # Errors
    ///
    /// Returns `BpmOutOfRange` if `bpm` is not supported. The previous
    /// tempo is kept in that case.
    pub fn set_internal_bpm(&mut self, bpm: f32) -> Result<(), ConfigurationError> {
        let tempo = Tempo::new(bpm)?;
        self.internal_tempo = tempo;
        self.internal.set_tempo(tempo);
        Ok(())
    }
}
