//! Structures used to pass the current state of analog inputs.

/// The current state of all analog peripherals.
///
/// `Snapshot` is meant to be passed from the hardware binding to the
/// control package once per control loop tick. All values are normalized
/// to 0.0 to 1.0.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub ratio: [f32; 4],
    pub time_signature: f32,
    pub cv: f32,
}
