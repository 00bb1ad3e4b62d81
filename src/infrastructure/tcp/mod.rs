// TCP module - Bath connection, request gate and simulated device
pub mod client;
pub mod connection;
pub mod server;

pub use client::TcpClient;
pub use connection::Connection;
pub use server::DeviceSimulator;
