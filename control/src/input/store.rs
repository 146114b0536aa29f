//! Process analog inputs over time.

use super::pot::Pot;
use super::snapshot::Snapshot;
use crate::ratio::{self, Ratio};

/// Stateful store of raw analog inputs.
///
/// This turns the raw snapshot into smoothened pots and maps them to the
/// selection of ratios and the bar length.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Store {
    pub ratio: [Pot; 4],
    pub time_signature: Pot,
    pub cv: f32,
}

impl Store {
    pub fn update(&mut self, snapshot: Snapshot) {
        for (pot, value) in self.ratio.iter_mut().zip(snapshot.ratio) {
            pot.update(value);
        }
        self.time_signature.update(snapshot.time_signature);
        // Reserved for modulation, it does not affect timing yet.
        self.cv = snapshot.cv;
    }

    pub fn ratios(&self) -> [Ratio; 4] {
        self.ratio.map(|pot| ratio::from_pot(pot.value()))
    }

    pub fn beats_per_bar(&self) -> u8 {
        ratio::beats_from_pot(self.time_signature.value())
    }
}
