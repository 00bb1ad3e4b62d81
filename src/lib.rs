//! Huber Library
//!
//! Async TCP driver for Huber recirculating baths: register codec,
//! connection handling with timeout recovery, and typed property access.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{HuberError, HuberResult};
pub use crate::domain::config::{ConnectionConfig, HuberConfig};
pub use crate::domain::fault::{FaultRecord, FaultTable};
pub use crate::domain::field::{Field, FieldDescriptor, FieldFormat};
pub use crate::core::bath::{Bath, BathControl};
pub use crate::core::codec::FieldValue;
pub use crate::core::snapshot::Snapshot;
pub use crate::core::communication::{Command, Transport, TransportStats};
pub use crate::infrastructure::mock::MockBath;
pub use crate::infrastructure::simulator::{MemoryTransport, RegisterFile};
pub use crate::infrastructure::tcp::{DeviceSimulator, TcpClient};
