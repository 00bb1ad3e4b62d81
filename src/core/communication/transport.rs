use crate::core::communication::frame::Command;
use crate::domain::error::HuberResult;
use async_trait::async_trait;
use serde::Serialize;

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    Tcp,
    Memory,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Tcp => write!(f, "tcp"),
            TransportType::Memory => write!(f, "memory"),
        }
    }
}

/// Request/response channel to a bath.
///
/// Implementations serve one request at a time. `Ok(None)` means the device
/// did not give a usable answer (timeout, disconnect, malformed echo); errors
/// are reserved for conditions the caller must see, such as an unsupported
/// register.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport type
    fn transport_type(&self) -> TransportType;

    /// Send one command and wait for its echo
    async fn request(&self, command: Command) -> HuberResult<Option<i32>>;

    /// Open the connection now instead of on the first request
    async fn connect(&self) -> HuberResult<()>;

    /// Release the connection; safe to call repeatedly
    async fn close(&self);

    /// Check if the connection is currently open
    async fn is_open(&self) -> bool;

    /// Request counters
    async fn stats(&self) -> TransportStats;
}

/// Transport counters for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransportStats {
    pub requests: u64,
    pub timeouts: u64,
    pub consecutive_timeouts: u32,
    pub connects: u64,
    pub is_open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_type_display() {
        assert_eq!(TransportType::Tcp.to_string(), "tcp");
        assert_eq!(TransportType::Memory.to_string(), "memory");
    }

    #[test]
    fn test_stats_default() {
        let stats = TransportStats::default();
        assert_eq!(stats.requests, 0);
        assert!(!stats.is_open);
    }
}
