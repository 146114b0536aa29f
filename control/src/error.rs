use core::fmt;

/// Rejected configuration value.
///
/// Whenever one of these is returned, the previous valid value is kept in
/// place.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    BpmOutOfRange(f32),
    InvalidRatio { multiplier: u8, divisor: u8 },
    InvalidThreshold(f32),
    InvalidDuration,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BpmOutOfRange(bpm) => write!(f, "BPM {bpm} is outside of the supported range"),
            Self::InvalidRatio {
                multiplier,
                divisor,
            } => write!(f, "ratio {multiplier}/{divisor} is not supported"),
            Self::InvalidThreshold(threshold) => {
                write!(f, "BPM change threshold {threshold} must be positive")
            }
            Self::InvalidDuration => write!(f, "durations must be non-zero"),
        }
    }
}
