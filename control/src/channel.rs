//! A single gate output following a scaled clock.

use crate::ratio::Ratio;
use crate::time::{self, Instant};

/// How the gate reacts to the channel firing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateMode {
    /// Go high for the trigger width, then return low.
    #[default]
    Trigger,
    /// Flip the gate on every fire, producing a square wave at half the rate.
    Toggle,
}

/// Gate output firing at a ratio of the base period.
///
/// Fire times are computed from a phase anchor rather than accumulated
/// from the previous fire, so fractional periods (such as a third of the
/// base period) never accumulate rounding error. The anchor moves by one
/// whole cycle after every `multiplier` fires.
///
/// The channel does not fire until it is placed on the beat grid through
/// `align`.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    ratio: Ratio,
    mode: GateMode,
    phase: Option<Phase>,
    base_period: u32,
    last_fire: Option<Instant>,
    gate: bool,
    pub fires: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Phase {
    anchor: Instant,
    fires: u32,
}

impl Channel {
    #[must_use]
    pub fn new(ratio: Ratio, mode: GateMode) -> Self {
        Self {
            ratio,
            mode,
            ..Self::default()
        }
    }

    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Change the ratio. The channel must be aligned again afterwards.
    pub fn set_ratio(&mut self, ratio: Ratio) {
        if ratio != self.ratio {
            self.ratio = ratio;
            self.phase = None;
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.phase.is_some()
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
    }

    /// Time between two fires, rounded down.
    pub fn period(&self) -> u32 {
        self.ratio.period(self.base_period)
    }

    /// Place the channel on the beat grid.
    ///
    /// `beat` is the number of the input beat starting at `at`, counted
    /// from the start of the bar. A divided channel starts its cycle on
    /// beats divisible by its divisor. Fires at or before the last fire are
    /// not repeated.
    pub fn align(&mut self, at: Instant, base_period: u32, beat: u32) {
        let multiplier = u32::from(self.ratio.multiplier());
        let divisor = u32::from(self.ratio.divisor());
        let position = beat % divisor;

        let mut phase = Phase {
            anchor: at.wrapping_sub(base_period.saturating_mul(position)),
            fires: (position * multiplier).div_ceil(divisor),
        };
        if phase.fires >= multiplier {
            phase.anchor = phase.anchor.wrapping_add(self.ratio.cycle(base_period));
            phase.fires = 0;
        }
        self.base_period = base_period;
        self.phase = Some(phase);

        if let Some(last_fire) = self.last_fire {
            self.skip_while(|deadline| time::reached(last_fire, deadline));
        }
    }

    /// Drop fires scheduled before `now` without emitting them.
    pub fn skip_before(&mut self, now: Instant) {
        self.skip_while(|deadline| deadline != now && time::reached(now, deadline));
    }

    /// Restart the cycle at `at`, continuing from `now` on.
    pub fn reset(&mut self, at: Instant, base_period: u32, now: Instant) {
        self.align(at, base_period, 0);
        self.skip_before(now);
        if self.mode == GateMode::Toggle {
            self.gate = false;
        }
    }

    /// Leave the beat grid, holding the gate low.
    pub fn stop(&mut self) {
        self.phase = None;
        self.last_fire = None;
        self.gate = false;
    }

    /// Advance the channel to `now`. Returns true if the channel fired.
    pub fn tick(&mut self, now: Instant, trigger_width: u32) -> bool {
        let mut fired = false;

        if let Some(phase) = self.phase.as_mut() {
            loop {
                let deadline = phase.deadline(self.ratio, self.base_period);
                if !time::reached(now, deadline) {
                    break;
                }
                fired = true;
                self.last_fire = Some(deadline);
                self.fires = self.fires.wrapping_add(1);
                if self.mode == GateMode::Toggle {
                    self.gate = !self.gate;
                }
                phase.advance(self.ratio, self.base_period);
            }
        }

        if self.mode == GateMode::Trigger {
            let width = trigger_width.min(self.period() / 2);
            self.gate = self
                .last_fire
                .is_some_and(|fire| time::elapsed(now, fire) < width);
        }

        fired
    }

    fn skip_while(&mut self, mut skip: impl FnMut(Instant) -> bool) {
        let (ratio, base_period) = (self.ratio, self.base_period);
        if let Some(phase) = self.phase.as_mut() {
            while skip(phase.deadline(ratio, base_period)) {
                phase.advance(ratio, base_period);
            }
        }
    }
}

impl Phase {
    fn deadline(&self, ratio: Ratio, base_period: u32) -> Instant {
        self.anchor.wrapping_add(ratio.offset(base_period, self.fires))
    }

    fn advance(&mut self, ratio: Ratio, base_period: u32) {
        self.fires += 1;
        if self.fires >= ratio.multiplier() as u32 {
            self.anchor = self.anchor.wrapping_add(ratio.cycle(base_period));
            self.fires = 0;
        }
    }
}
