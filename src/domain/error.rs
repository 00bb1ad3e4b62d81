use thiserror::Error;

/// Huber driver unified error type
#[derive(Error, Debug)]
pub enum HuberError {
    #[error("Unknown field '{path}'")]
    Lookup { path: String },

    #[error("Can not write to {field}")]
    NotWritable { field: String },

    #[error("Value {value} for {field} outside allowed range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Command not enabled on this Huber model")]
    DeviceNotSupported,

    #[error("Could not set {field} (no response)")]
    NoResponse { field: String },

    #[error("Could not set {field} (requested {requested}, device reports {received})")]
    WriteVerification {
        field: String,
        requested: f64,
        received: f64,
    },

    #[error("Connecting to {addr} timed out")]
    ConnectionTimeout { addr: String },

    #[error("Reading from {addr} timed out")]
    ReadTimeout { addr: String },

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl HuberError {
    /// Timeouts are recovered locally and never abort a request sequence
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HuberError::ConnectionTimeout { .. } | HuberError::ReadTimeout { .. }
        )
    }
}

pub type HuberResult<T> = Result<T, HuberError>;
