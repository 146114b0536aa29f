//! Analog inputs selecting ratios of the outputs.

mod buffer;
mod pot;
mod snapshot;
mod store;

pub use pot::Pot;
pub use snapshot::Snapshot;
pub use store::Store;
