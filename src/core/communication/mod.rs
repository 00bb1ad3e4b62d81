// Communication module - Wire frames and the transport abstraction
pub mod frame;
pub mod transport;

pub use frame::Command;
pub use transport::{Transport, TransportStats, TransportType};
