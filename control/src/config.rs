//! Timing constants of the module.

use fugit::MicrosDurationU32;

use crate::channel::GateMode;
use crate::error::ConfigurationError;
use crate::generator::CHANNELS;
use crate::internal_clock::{BPM_RANGE, DEFAULT_BPM};

/// Boot-time configuration.
///
/// None of this is persisted, the firmware builds it once on start.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Minimal BPM change to publish a new stable clock.
    pub bpm_change_threshold: f32,
    /// Holding reset for this long toggles the mode.
    pub long_press: MicrosDurationU32,
    /// Reset must stay released this long for the release to count.
    pub reset_debounce: MicrosDurationU32,
    /// Length of the pulse on trigger outputs.
    pub clock_trig: MicrosDurationU32,
    pub internal_bpm: f32,
    /// Number of stable periods without an external edge after which the
    /// internal clock takes over. Disabled when `None`.
    pub silence_fallback: Option<u32>,
    pub gate_modes: [GateMode; CHANNELS],
    pub downbeat_mode: GateMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm_change_threshold: 1.0,
            long_press: MicrosDurationU32::millis(1000),
            reset_debounce: MicrosDurationU32::millis(20),
            clock_trig: MicrosDurationU32::millis(10),
            internal_bpm: DEFAULT_BPM,
            silence_fallback: None,
            gate_modes: [GateMode::Trigger; CHANNELS],
            downbeat_mode: GateMode::Trigger,
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Fails when any of the values is outside of its supported range.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bpm_change_threshold.is_nan() || self.bpm_change_threshold <= 0.0 {
            return Err(ConfigurationError::InvalidThreshold(
                self.bpm_change_threshold,
            ));
        }
        if !BPM_RANGE.contains(&self.internal_bpm) {
            return Err(ConfigurationError::BpmOutOfRange(self.internal_bpm));
        }
        let durations = [self.long_press, self.reset_debounce, self.clock_trig];
        if durations.iter().any(|d| d.ticks() == 0) || self.silence_fallback == Some(0) {
            return Err(ConfigurationError::InvalidDuration);
        }
        Ok(())
    }
}
