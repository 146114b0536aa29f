//! Derive all gate outputs from the stable clock.

use crate::channel::{Channel, GateMode};
use crate::error::ConfigurationError;
use crate::estimator::{Edge, StableClock};
use crate::output::DesiredOutput;
use crate::ratio::Ratio;
use crate::time::{self, Instant};

pub const CHANNELS: usize = 4;

// Least common multiple of all supported divisors, the beat counter can
// wrap around it without moving any cycle.
const BEATS_WRAP: u32 = 720_720;

/// Four ratio outputs and the downbeat, sharing one beat grid.
///
/// All channels count input beats from the same start of the bar. Every
/// time a new stable clock is published, they are aligned again to the
/// input edge it was measured on, so multiplied outputs stay on the input
/// edges and the downbeat lands together with divided outputs.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Generator {
    pub channels: [Channel; CHANNELS],
    pub downbeat: Channel,
    trigger_width: u32,
    clock: Option<StableClock>,
    grid: Option<Grid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Grid {
    period: u32,
    /// Start of the current input beat.
    beat_at: Instant,
    /// Number of the current input beat within the bar.
    beat: u32,
    /// Number of a clock edge and of the beat it started.
    reference: Option<(u32, u32)>,
}

impl Generator {
    #[must_use]
    pub fn new(modes: [GateMode; CHANNELS], downbeat_mode: GateMode, trigger_width: u32) -> Self {
        Self {
            channels: modes.map(|mode| Channel::new(Ratio::UNITY, mode)),
            downbeat: Channel::new(Ratio::UNITY, downbeat_mode),
            trigger_width,
            clock: None,
            grid: None,
        }
    }

    /// Advance all outputs to `now`.
    ///
    /// Without a stable clock all gates are held low.
    pub fn tick(&mut self, now: Instant, clock: Option<StableClock>) -> DesiredOutput {
        let Some(clock) = clock else {
            self.clock = None;
            self.grid = None;
            self.all_channels().for_each(Channel::stop);
            return DesiredOutput::default();
        };

        if self.clock != Some(clock) {
            self.follow(clock);
        }

        let Some(mut grid) = self.grid else {
            return DesiredOutput::default();
        };
        while time::reached(now, grid.beat_at.wrapping_add(grid.period)) {
            grid.beat_at = grid.beat_at.wrapping_add(grid.period);
            grid.beat = (grid.beat + 1) % BEATS_WRAP;
        }
        self.grid = Some(grid);

        let width = self.trigger_width;
        for channel in self.all_channels().filter(|c| !c.is_aligned()) {
            channel.align(grid.beat_at, grid.period, grid.beat);
            channel.skip_before(now);
        }

        let mut output = DesiredOutput::default();
        for (gate, channel) in output.gates.iter_mut().zip(self.channels.iter_mut()) {
            channel.tick(now, width);
            *gate = channel.gate();
        }
        self.downbeat.tick(now, width);
        output.downbeat = self.downbeat.gate();

        output
    }

    // Move the grid onto the edge the new clock was measured on.
    fn follow(&mut self, clock: StableClock) {
        let beat = match self.grid.and_then(|grid| grid.reference) {
            Some((edge, beat)) => {
                let passed = clock.edge.wrapping_sub(edge) % BEATS_WRAP;
                (beat + passed) % BEATS_WRAP
            }
            None => 0,
        };
        self.clock = Some(clock);
        self.grid = Some(Grid {
            period: clock.period,
            beat_at: clock.updated_at,
            beat,
            reference: Some((clock.edge, beat)),
        });
        self.all_channels()
            .for_each(|channel| channel.align(clock.updated_at, clock.period, beat));
    }

    /// # Panics
    ///
    /// Panics if `channel` is not lower than `CHANNELS`.
    pub fn set_ratio(&mut self, channel: usize, ratio: Ratio) {
        self.channels[channel].set_ratio(ratio);
    }

    /// Set how many input beats form one bar of the downbeat.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRatio` when `beats` is not supported. The previous
    /// bar length is kept in that case.
    pub fn set_beats_per_bar(&mut self, beats: u8) -> Result<(), ConfigurationError> {
        let ratio = Ratio::bar(beats)?;
        self.downbeat.set_ratio(ratio);
        Ok(())
    }

    /// Start a new bar at `at`, continuing from `now` on.
    ///
    /// Later clock edges are numbered relative to `last_edge`, so the bar
    /// position survives re-alignment to a newly published clock.
    pub fn reset(&mut self, at: Instant, now: Instant, last_edge: Option<Edge>) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let period = grid.period;
        grid.beat_at = at;
        grid.beat = 0;
        grid.reference = last_edge.map(|edge| {
            let beat = beats_between(at, edge.at, period);
            (edge.number, beat)
        });
        self.all_channels()
            .for_each(|channel| channel.reset(at, period, now));
    }

    fn all_channels(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels
            .iter_mut()
            .chain(core::iter::once(&mut self.downbeat))
    }
}

// Whole beats from `from` to `to`, rounded, wrapped into the bar counter.
fn beats_between(from: Instant, to: Instant, period: u32) -> u32 {
    let offset = i64::from(to.wrapping_sub(from) as i32);
    let period = i64::from(period.max(1));
    let beats = (offset + period / 2).div_euclid(period);
    beats.rem_euclid(i64::from(BEATS_WRAP)) as u32
}
