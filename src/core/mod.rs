// Core module - Codec, property access and snapshots
pub mod bath;
pub mod codec;
pub mod communication;
pub mod snapshot;

pub use bath::{Bath, BathControl};
pub use codec::FieldValue;
pub use snapshot::Snapshot;
