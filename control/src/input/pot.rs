//! Pot abstraction tracking its state over time.

#[allow(unused_imports)]
use micromath::F32Ext;

use super::buffer::Buffer;

// Smaller movements are considered noise of the ADC.
const NOISE_FLOOR: f32 = 0.002;

/// Abstraction of a potentiometer.
///
/// Use it to smoothen the value received from pots, so the selection
/// mapped from it does not flicker on a boundary.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pot {
    buffer: Buffer<16>,
    value: f32,
}

impl Pot {
    pub fn update(&mut self, value: f32) {
        self.buffer.write(value);

        let smoothed = self.buffer.read();
        if (self.value - smoothed).abs() > NOISE_FLOOR {
            self.value = smoothed;
        } else if smoothed < 0.0001 {
            self.value = 0.0;
        } else if smoothed > 0.9999 {
            self.value = 1.0;
        }
    }

    /// Smoothened value, ignoring movements below the noise floor.
    pub fn value(&self) -> f32 {
        self.value
    }
}
