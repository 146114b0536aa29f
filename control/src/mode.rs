//! Selection of the clock source.
//!
//! ```text
//!                    first stable period
//!  [ ExternalWaiting ] ------------------> [ ExternalLocked ]
//!     A    A      |                          |          |
//!     |    |      | long press    long press |          | silence
//!     |    |      V                          |          V
//!     |    +-- [ Internal(User) ] <----------+   [ Internal(Silence) ]
//!     |          long press                             |
//!     +------------------ external edge ----------------+
//! ```

use crate::log;

/// Operating mode of the module.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Following the external clock, but no stable period was measured yet.
    #[default]
    ExternalWaiting,
    /// Following the external clock with an established period.
    ExternalLocked,
    /// Generating the clock internally.
    Internal(Engaged),
}

/// What made the module switch to the internal clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Engaged {
    User,
    Silence,
}

impl Mode {
    /// Response to a long press of the reset input.
    #[must_use]
    pub fn toggle(self) -> Self {
        let next = match self {
            Self::ExternalWaiting | Self::ExternalLocked => Self::Internal(Engaged::User),
            Self::Internal(_) => Self::ExternalWaiting,
        };
        log::info!("Mode toggled to {}", next);
        next
    }

    /// Response to the first stable period measured from the external clock.
    #[must_use]
    pub fn lock(self) -> Self {
        match self {
            Self::ExternalWaiting => {
                log::info!("Locked to external clock");
                Self::ExternalLocked
            }
            other => other,
        }
    }

    /// Response to a prolonged absence of external clock edges.
    #[must_use]
    pub fn fall_back(self) -> Self {
        match self {
            Self::ExternalLocked => {
                log::warning!("External clock went silent, falling back to internal");
                Self::Internal(Engaged::Silence)
            }
            other => other,
        }
    }

    /// Response to an external clock edge arriving.
    #[must_use]
    pub fn resume(self) -> Self {
        match self {
            Self::Internal(Engaged::Silence) => {
                log::info!("External clock is back");
                Self::ExternalWaiting
            }
            other => other,
        }
    }

    pub fn is_external(self) -> bool {
        matches!(self, Self::ExternalWaiting | Self::ExternalLocked)
    }

    pub fn is_internal(self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
