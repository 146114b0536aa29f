//! Free running clock used when no external clock is followed.

use core::ops::RangeInclusive;

use crate::error::ConfigurationError;
use crate::log;
use crate::time::{self, Instant};

pub const BPM_RANGE: RangeInclusive<f32> = 60.0..=240.0;

pub const DEFAULT_BPM: f32 = 120.0;

/// Tempo within `BPM_RANGE`, together with its period.
///
/// The only way to get one is through `Tempo::new`, so holding a `Tempo`
/// means the value was already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tempo {
    bpm: f32,
    period: u32,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            period: time::bpm_to_period(DEFAULT_BPM),
        }
    }
}

impl Tempo {
    /// # Errors
    ///
    /// Returns `BpmOutOfRange` if `bpm` is outside of `BPM_RANGE`.
    pub fn new(bpm: f32) -> Result<Self, ConfigurationError> {
        if !BPM_RANGE.contains(&bpm) {
            log::warning!("Rejected BPM {=f32}", bpm);
            return Err(ConfigurationError::BpmOutOfRange(bpm));
        }
        Ok(Self {
            bpm,
            period: time::bpm_to_period(bpm),
        })
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}

/// Synthesize clock edges at a fixed tempo.
///
/// Pulses are scheduled relative to the previous scheduled pulse, not to
/// the tick they were noticed on, so the tempo does not drift with the
/// control loop's polling jitter.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InternalClock {
    tempo: Tempo,
    last_pulse: Option<Instant>,
}

impl InternalClock {
    #[must_use]
    pub fn new(tempo: Tempo) -> Self {
        Self {
            tempo,
            last_pulse: None,
        }
    }

    /// Change the tempo. Pulses already scheduled keep their time, the
    /// next one comes one new period after the last.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Start generating, with the first pulse due immediately.
    pub fn start(&mut self, now: Instant) {
        self.last_pulse = Some(now.wrapping_sub(self.tempo.period));
    }

    pub fn stop(&mut self) {
        self.last_pulse = None;
    }

    /// Return the timestamp of a pulse if one became due.
    ///
    /// If the loop stalled for several periods, the missed pulses are
    /// returned one per call.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        let last_pulse = self.last_pulse?;
        let period = self.tempo.period;
        if time::elapsed(now, last_pulse) >= period {
            let pulse = last_pulse.wrapping_add(period);
            self.last_pulse = Some(pulse);
            Some(pulse)
        } else {
            None
        }
    }
}
