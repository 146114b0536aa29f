/// Desired state of the gate outputs.
///
/// This structure transfers the request to the hardware binding, asking it
/// to set the four channel gates and the downbeat gate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DesiredOutput {
    pub gates: [bool; 4],
    pub downbeat: bool,
}
