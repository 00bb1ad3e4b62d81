use crate::core::communication::frame::Command;
use crate::core::communication::transport::{Transport, TransportStats, TransportType};
use crate::domain::config::ConnectionConfig;
use crate::domain::error::{HuberError, HuberResult};
use crate::infrastructure::tcp::connection::Connection;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

struct ClientState {
    connection: Connection,
    consecutive_timeouts: u32,
    requests: u64,
    timeouts: u64,
    // Set while a frame is on the wire; still set on entry means the
    // previous request was cancelled mid-exchange.
    in_flight: bool,
}

/// TCP transport to a bath.
///
/// All requests go through one async mutex, so at most one frame is on the
/// wire and queued callers are served in arrival order. The guard is dropped
/// when a request future is cancelled, so the gate can never stay locked.
pub struct TcpClient {
    config: ConnectionConfig,
    state: Mutex<ClientState>,
}

impl TcpClient {
    pub fn new(config: ConnectionConfig) -> Self {
        let connection = Connection::new(config.address());
        Self {
            config,
            state: Mutex::new(ClientState {
                connection,
                consecutive_timeouts: 0,
                requests: 0,
                timeouts: 0,
                in_flight: false,
            }),
        }
    }

    /// Send a command and decode the echoed value.
    ///
    /// Timeouts and I/O failures yield `Ok(None)`; only protocol errors
    /// such as an unsupported register are returned as `Err`.
    pub async fn send(&self, command: Command) -> HuberResult<Option<i32>> {
        let timeout = self.config.timeout();
        let mut state = self.state.lock().await;
        state.requests += 1;

        if state.in_flight {
            warn!("Previous request to {} was cancelled, resynchronizing", self.config.address());
            state.connection.close().await;
            state.in_flight = false;
        }

        state.connection.ensure_open(timeout).await;

        debug!("-> {}", command);
        state.in_flight = true;
        let result = state.connection.exchange(&command.encode(), timeout).await;
        state.in_flight = false;

        let line = match result {
            Ok(line) => {
                state.consecutive_timeouts = 0;
                line
            }
            Err(e) => {
                self.record_failure(&mut state, &e);
                return Ok(None);
            }
        };
        drop(state);

        debug!("<- {}", line.trim_end());
        let value = command.parse_response(&line)?;
        if value.is_none() {
            debug!("Discarding malformed response {:?} to {}", line.trim_end(), command);
        }
        Ok(value)
    }

    fn record_failure(&self, state: &mut ClientState, e: &HuberError) {
        state.timeouts += 1;
        state.consecutive_timeouts = state.consecutive_timeouts.saturating_add(1);
        if state.consecutive_timeouts == self.config.max_timeouts {
            error!(
                "Reading from {} timed out {} times",
                self.config.address(),
                state.consecutive_timeouts
            );
        } else {
            debug!("Request to {} failed: {}", self.config.address(), e);
        }
    }
}

#[async_trait]
impl Transport for TcpClient {
    fn transport_type(&self) -> TransportType {
        TransportType::Tcp
    }

    async fn request(&self, command: Command) -> HuberResult<Option<i32>> {
        self.send(command).await
    }

    async fn connect(&self) -> HuberResult<()> {
        let mut state = self.state.lock().await;
        state.connection.open(self.config.timeout()).await
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        state.connection.close().await;
    }

    async fn is_open(&self) -> bool {
        self.state.lock().await.connection.is_open()
    }

    async fn stats(&self) -> TransportStats {
        let state = self.state.lock().await;
        TransportStats {
            requests: state.requests,
            timeouts: state.timeouts,
            consecutive_timeouts: state.consecutive_timeouts,
            connects: state.connection.connects(),
            is_open: state.connection.is_open(),
        }
    }
}
