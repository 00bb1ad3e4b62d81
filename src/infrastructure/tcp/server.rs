use crate::core::communication::frame::Command;
use crate::domain::error::{HuberError, HuberResult};
use crate::infrastructure::simulator::RegisterFile;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// TCP server speaking the bath protocol from a [`RegisterFile`]
pub struct DeviceSimulator {
    listener: Option<TcpListener>,
    bind_addr: SocketAddr,
    registers: Arc<Mutex<RegisterFile>>,
    clients: Arc<Mutex<Vec<SocketAddr>>>,
    response_delay: Duration,
    shutdown_sender: Option<mpsc::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl DeviceSimulator {
    pub async fn new(bind_addr: &str, registers: RegisterFile) -> HuberResult<Self> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| HuberError::Config {
            message: format!("Failed to bind to {}: {}", bind_addr, e),
        })?;
        let actual_addr = listener.local_addr()?;

        info!("Bath simulator created on {}", actual_addr);

        Ok(Self {
            listener: Some(listener),
            bind_addr: actual_addr,
            registers: Arc::new(Mutex::new(registers)),
            clients: Arc::new(Mutex::new(Vec::new())),
            response_delay: Duration::ZERO,
            shutdown_sender: None,
            server_handle: None,
        })
    }

    pub fn get_bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Delay every answer, e.g. to make request ordering observable
    pub fn set_response_delay(&mut self, delay: Duration) {
        self.response_delay = delay;
    }

    /// Shared handle to the simulated registers
    pub fn registers(&self) -> Arc<Mutex<RegisterFile>> {
        Arc::clone(&self.registers)
    }

    pub async fn start(&mut self) -> HuberResult<()> {
        let listener = self.listener.take().ok_or_else(|| {
            HuberError::Config {
                message: "Simulator is already running".to_string(),
            }
        })?;

        info!("Starting bath simulator on {}", self.bind_addr);

        let registers = Arc::clone(&self.registers);
        let clients = Arc::clone(&self.clients);
        let response_delay = self.response_delay;
        let (shutdown_sender, mut shutdown_receiver) = mpsc::channel(1);

        let server_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, addr)) => {
                                info!("New client connected: {}", addr);
                                clients.lock().await.push(addr);

                                let registers = Arc::clone(&registers);
                                let clients = Arc::clone(&clients);
                                tokio::spawn(async move {
                                    if let Err(e) = Self::handle_client(stream, addr, registers, response_delay).await {
                                        debug!("Client {} ended with error: {}", addr, e);
                                    }
                                    clients.lock().await.retain(|c| *c != addr);
                                    info!("Client disconnected: {}", addr);
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {}", e);
                            }
                        }
                    }

                    _ = shutdown_receiver.recv() => {
                        info!("Received shutdown signal, stopping simulator");
                        break;
                    }
                }
            }
        });

        self.shutdown_sender = Some(shutdown_sender);
        self.server_handle = Some(server_handle);
        Ok(())
    }

    async fn handle_client(
        stream: TcpStream,
        addr: SocketAddr,
        registers: Arc<Mutex<RegisterFile>>,
        response_delay: Duration,
    ) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                debug!("Client {} disconnected gracefully", addr);
                return Ok(());
            }

            let Some(command) = Command::parse_request(&line) else {
                debug!("Ignoring malformed frame {:?} from {}", line.trim_end(), addr);
                continue;
            };

            let response = registers.lock().await.respond(command);
            if let Some(response) = response {
                if !response_delay.is_zero() {
                    tokio::time::sleep(response_delay).await;
                }
                reader.get_mut().write_all(response.as_bytes()).await?;
                reader.get_mut().flush().await?;
            }
        }
    }

    pub async fn stop(&mut self) -> HuberResult<()> {
        if let Some(handle) = self.server_handle.take() {
            info!("Stopping bath simulator");

            if let Some(sender) = self.shutdown_sender.take() {
                if let Err(e) = sender.send(()).await {
                    warn!("Failed to send shutdown signal: {}", e);
                }
            }

            if let Err(e) = handle.await {
                warn!("Simulator task completed with error: {}", e);
            }
        }

        Ok(())
    }

    pub async fn get_client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for DeviceSimulator {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_simulator_start_stop() {
        let mut simulator = DeviceSimulator::new("127.0.0.1:0", RegisterFile::new())
            .await
            .unwrap();
        assert!(!simulator.is_running());

        simulator.start().await.unwrap();
        assert!(simulator.is_running());
        assert!(simulator.start().await.is_err());

        simulator.stop().await.unwrap();
        assert!(!simulator.is_running());
    }

    #[tokio::test]
    async fn test_simulator_answers_frames() {
        let mut simulator = DeviceSimulator::new("127.0.0.1:0", RegisterFile::new())
            .await
            .unwrap();
        simulator.start().await.unwrap();

        let mut client = TcpStream::connect(simulator.get_bind_addr()).await.unwrap();
        client.write_all(b"garbage\r\n{M00****\r\n").await.unwrap();

        let mut response = [0u8; 10];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(&response, b"{S001388\r\n");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(simulator.get_client_count().await, 1);
        assert_eq!(simulator.registers().lock().await.received().len(), 1);

        drop(client);
        simulator.stop().await.unwrap();
    }
}
