//! Clock divider and multiplier for a eurorack module.
//!
//! It follows an external clock, or generates its own, and derives four gate
//! outputs running at multiples or divisions of its tempo, plus a downbeat
//! marking the start of each bar.
//!
//! It is meant to run in a firmware with interrupt handlers recording
//! incoming edges and a control loop polling the rest:
//!
//! ```text
//!   [ Clock IRQ ]   [ Reset IRQ ]
//!          |             |
//!          V             V
//!          {    Edges    }                 [ Pots ] [ CV ]
//!                 |                             |      |
//!                 | (Capture)        (Snapshot) |      |
//!                 V                             V      V
//!   [ ControlLoop: ResetGesture -> Mode -> PeriodEstimator -> Generator ]
//!                                   A                            |
//!                                   |                            | (DesiredOutput)
//!                           [ InternalClock ]                    V
//!                                                       [ Gates ] [ Downbeat ]
//! ```

#![cfg_attr(not(test), no_std)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod capture;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod generator;
pub mod gesture;
pub mod input;
pub mod internal_clock;
mod log;
pub mod mode;
pub mod output;
pub mod queue;
pub mod ratio;
pub mod time;

pub use capture::Edges;
pub use channel::GateMode;
pub use clock::{Clock, Diagnostics};
pub use config::Config;
pub use error::ConfigurationError;
pub use estimator::StableClock;
pub use input::Snapshot;
pub use mode::Mode;
pub use output::DesiredOutput;
pub use ratio::Ratio;
