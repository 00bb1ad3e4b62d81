// Domain module - Configuration, errors and the register map
pub mod config;
pub mod error;
pub mod fault;
pub mod field;

pub use config::{ConnectionConfig, HuberConfig, LoggingConfig};
pub use error::{HuberError, HuberResult};
pub use fault::{FaultRecord, FaultTable};
pub use field::{Field, FieldDescriptor, FieldFormat};
