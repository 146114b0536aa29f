//! Scaling of the base period for individual outputs.

use crate::error::ConfigurationError;

/// The biggest supported multiplier or divisor.
pub const MAX_FACTOR: u8 = 16;

/// Ratios selectable by an output's potentiometer, slowest first.
pub const TABLE: [Ratio; 9] = [
    Ratio::divided(8),
    Ratio::divided(4),
    Ratio::divided(3),
    Ratio::divided(2),
    Ratio::UNITY,
    Ratio::multiplied(2),
    Ratio::multiplied(3),
    Ratio::multiplied(4),
    Ratio::multiplied(8),
];

/// Longest bar selectable for the downbeat, in beats.
pub const MAX_BEATS_PER_BAR: u8 = 8;

/// Positive rational rate of an output relative to the input clock.
///
/// Multiplier of 2 fires twice per input pulse, divisor of 4 fires once
/// per four input pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ratio {
    multiplier: u8,
    divisor: u8,
}

impl Default for Ratio {
    fn default() -> Self {
        Self::UNITY
    }
}

impl Ratio {
    pub const UNITY: Self = Self {
        multiplier: 1,
        divisor: 1,
    };

    /// # Errors
    ///
    /// Returns `InvalidRatio` when either side is zero or above `MAX_FACTOR`.
    pub fn new(multiplier: u8, divisor: u8) -> Result<Self, ConfigurationError> {
        let valid = 1..=MAX_FACTOR;
        if valid.contains(&multiplier) && valid.contains(&divisor) {
            Ok(Self {
                multiplier,
                divisor,
            })
        } else {
            Err(ConfigurationError::InvalidRatio {
                multiplier,
                divisor,
            })
        }
    }

    const fn multiplied(multiplier: u8) -> Self {
        Self {
            multiplier,
            divisor: 1,
        }
    }

    const fn divided(divisor: u8) -> Self {
        Self {
            multiplier: 1,
            divisor,
        }
    }

    /// Downbeat ratio, firing once per bar.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRatio` when `beats` is zero or above `MAX_FACTOR`.
    pub fn bar(beats: u8) -> Result<Self, ConfigurationError> {
        Self::new(1, beats)
    }

    pub fn multiplier(&self) -> u8 {
        self.multiplier
    }

    pub fn divisor(&self) -> u8 {
        self.divisor
    }

    /// Span of input time after which the output returns to its phase.
    ///
    /// During this span, the output fires exactly `multiplier` times.
    pub fn cycle(&self, base_period: u32) -> u32 {
        base_period.saturating_mul(self.divisor as u32)
    }

    /// Offset of the `fire`-th pulse within a cycle, rounded down.
    pub fn offset(&self, base_period: u32, fire: u32) -> u32 {
        let cycle = self.cycle(base_period) as u64;
        (cycle * fire as u64 / self.multiplier as u64) as u32
    }

    /// Average period of the output, rounded down.
    pub fn period(&self, base_period: u32) -> u32 {
        self.offset(base_period, 1)
    }
}

/// Pick a ratio from `TABLE` by a normalized pot position.
pub fn from_pot(value: f32) -> Ratio {
    TABLE[pot_to_index(value, TABLE.len())]
}

/// Pick the number of beats per bar by a normalized pot position.
pub fn beats_from_pot(value: f32) -> u8 {
    pot_to_index(value, MAX_BEATS_PER_BAR as usize) as u8 + 1
}

fn pot_to_index(value: f32, len: usize) -> usize {
    let index = (value.clamp(0.0, 1.0) * len as f32) as usize;
    index.min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_oversized_factors_are_rejected() {
        assert!(Ratio::new(0, 1).is_err());
        assert!(Ratio::new(1, 0).is_err());
        assert_eq!(
            Ratio::new(17, 1),
            Err(ConfigurationError::InvalidRatio {
                multiplier: 17,
                divisor: 1
            })
        );
        assert!(Ratio::new(16, 16).is_ok());
    }

    #[test]
    fn multiplied_ratio_shortens_period() {
        let ratio = Ratio::new(2, 1).unwrap();
        assert_eq!(ratio.period(500_000), 250_000);
    }

    #[test]
    fn divided_ratio_extends_period() {
        let ratio = Ratio::new(1, 4).unwrap();
        assert_eq!(ratio.period(500_000), 2_000_000);
    }

    #[test]
    fn fractional_offsets_sum_up_to_exact_cycle() {
        let ratio = Ratio::new(3, 1).unwrap();
        assert_eq!(ratio.offset(500_000, 1), 166_666);
        assert_eq!(ratio.offset(500_000, 2), 333_333);
        assert_eq!(ratio.offset(500_000, 3), 500_000);
    }

    #[test]
    fn pot_covers_whole_table() {
        assert_eq!(from_pot(0.0), Ratio::new(1, 8).unwrap());
        assert_eq!(from_pot(0.5), Ratio::UNITY);
        assert_eq!(from_pot(1.0), Ratio::new(8, 1).unwrap());
        assert_eq!(from_pot(-0.3), TABLE[0]);
        assert_eq!(from_pot(1.3), TABLE[8]);
    }

    #[test]
    fn pot_selects_beats_per_bar() {
        assert_eq!(beats_from_pot(0.0), 1);
        assert_eq!(beats_from_pot(0.99), 8);
        assert_eq!(beats_from_pot(1.0), 8);
    }

    #[test]
    fn table_is_ordered_from_slowest() {
        for pair in TABLE.windows(2) {
            assert!(pair[0].period(1_000) > pair[1].period(1_000));
        }
    }
}
