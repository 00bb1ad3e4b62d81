use crate::core::communication::frame::TERMINATOR;
use crate::domain::error::{HuberError, HuberResult};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Socket lifecycle of one bath connection.
///
/// Connects lazily, never retries in the background and only reports the
/// first of a run of failed connection attempts.
pub struct Connection {
    addr: String,
    stream: Option<BufReader<TcpStream>>,
    reconnecting: bool,
    connects: u64,
}

impl Connection {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
            reconnecting: false,
            connects: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// True while connection attempts keep failing
    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting
    }

    /// Number of successful connects so far
    pub fn connects(&self) -> u64 {
        self.connects
    }

    /// Connect, replacing any open socket
    pub async fn open(&mut self, timeout: Duration) -> HuberResult<()> {
        self.close().await;

        let stream = tokio::time::timeout(timeout, TcpStream::connect(self.addr.as_str()))
            .await
            .map_err(|_| HuberError::ConnectionTimeout {
                addr: self.addr.clone(),
            })??;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        info!("TCP connection established to {}", self.addr);
        self.stream = Some(BufReader::new(stream));
        self.connects += 1;
        Ok(())
    }

    /// Connect if closed. Failure leaves the connection closed and is
    /// logged once per run of failures.
    pub async fn ensure_open(&mut self, timeout: Duration) {
        if self.is_open() {
            self.reconnecting = false;
            return;
        }

        match self.open(timeout).await {
            Ok(()) => self.reconnecting = false,
            Err(e) => {
                if self.reconnecting {
                    debug!("Reconnect to {} failed: {}", self.addr, e);
                } else {
                    error!("Connecting to {} failed: {}", self.addr, e);
                }
                self.reconnecting = true;
            }
        }
    }

    /// Write a frame and read one `\r\n`-terminated line.
    ///
    /// Any failure drops the socket so a late or partial answer can never be
    /// taken for the reply to a later request.
    pub async fn exchange(&mut self, frame: &[u8], timeout: Duration) -> HuberResult<String> {
        let addr = self.addr.clone();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| HuberError::Network(io::Error::new(io::ErrorKind::NotConnected, "not connected")))?;

        let result = tokio::time::timeout(timeout, Self::write_and_read(stream, frame)).await;
        match result {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(e)) => {
                self.close().await;
                Err(HuberError::Network(e))
            }
            Err(_) => {
                self.close().await;
                Err(HuberError::ReadTimeout { addr })
            }
        }
    }

    async fn write_and_read(stream: &mut BufReader<TcpStream>, frame: &[u8]) -> io::Result<String> {
        stream.get_mut().write_all(frame).await?;
        stream.get_mut().flush().await?;

        let mut line = Vec::new();
        loop {
            let n = stream.read_until(b'\n', &mut line).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                ));
            }
            if line.ends_with(TERMINATOR) {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Release the socket; idempotent
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown().await {
                debug!("Failed to shutdown TCP stream to {}: {}", self.addr, e);
            }
            info!("TCP connection to {} closed", self.addr);
        }
    }
}
