// Simulator module - in-memory register file and transport
use crate::core::codec::NOT_SUPPORTED;
use crate::core::communication::frame::Command;
use crate::core::communication::transport::{Transport, TransportStats, TransportType};
use crate::domain::error::HuberResult;
use crate::domain::field::Field;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

const STATUS_CONTROLLING: i32 = 1 << 0;
const STATUS_CIRCULATING: i32 = 1 << 1;
const STATUS_PUMPING: i32 = 1 << 4;
const STATUS_ERROR: i32 = 1 << 8;
const STATUS_WARNING: i32 = 1 << 9;
const STATUS_RUNNING: i32 = STATUS_CONTROLLING | STATUS_CIRCULATING | STATUS_PUMPING;

/// Register values of a simulated bath
#[derive(Debug, Clone)]
pub struct RegisterFile {
    registers: HashMap<u8, i32>,
    silent: bool,
    received: Vec<Command>,
}

impl RegisterFile {
    /// A bath at rest: off, 50 °C setpoint, no faults
    pub fn new() -> Self {
        let registers = [
            (Field::On, 0),
            (Field::TemperatureSetpoint, 5000),
            (Field::TemperatureBath, 2349),
            (Field::TemperatureProcess, 2271),
            (Field::PumpPressure, 0),
            (Field::PumpSpeed, 0),
            (Field::PumpSetpoint, 3000),
            (Field::Fill, 820),
            (Field::Maintenance, 180),
            (Field::Status, 0),
            (Field::Error, 0),
            (Field::Warning, 0),
        ]
        .into_iter()
        .map(|(field, raw)| (field.descriptor().address, raw))
        .collect();

        Self {
            registers,
            silent: false,
            received: Vec::new(),
        }
    }

    pub fn get(&self, field: Field) -> Option<i32> {
        self.registers.get(&field.descriptor().address).copied()
    }

    /// Overwrite a raw register value
    pub fn set(&mut self, field: Field, raw: i32) {
        self.registers.insert(field.descriptor().address, raw);
    }

    /// Drop a register so the device reports it as not supported
    pub fn remove(&mut self, field: Field) {
        self.registers.remove(&field.descriptor().address);
    }

    /// Stop answering requests, as an unplugged bath would
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Latch a fault code on the error or warning register
    pub fn raise_fault(&mut self, field: Field, code: i32) {
        let bit = match field {
            Field::Error => STATUS_ERROR,
            Field::Warning => STATUS_WARNING,
            _ => return,
        };
        self.set(field, code);
        self.update_status(|status| status | bit);
    }

    /// Every request seen so far, in arrival order
    pub fn received(&self) -> &[Command] {
        &self.received
    }

    /// Apply a request and build the response line, if the device answers
    pub fn respond(&mut self, command: Command) -> Option<String> {
        self.received.push(command);
        if self.silent {
            return None;
        }

        if !self.registers.contains_key(&command.address) {
            return Some(Command::response(command.address, NOT_SUPPORTED));
        }

        if let Some(value) = command.value {
            self.write(command.address, value);
        }
        let value = self.registers.get(&command.address).copied().unwrap_or(NOT_SUPPORTED);
        Some(Command::response(command.address, value))
    }

    fn write(&mut self, address: u8, value: i32) {
        if address == Field::Error.descriptor().address {
            self.registers.insert(address, 0);
            self.update_status(|status| status & !STATUS_ERROR);
        } else if address == Field::Warning.descriptor().address {
            self.registers.insert(address, 0);
            self.update_status(|status| status & !STATUS_WARNING);
        } else if address == Field::On.descriptor().address {
            let on = value != 0;
            self.registers.insert(address, i32::from(on));
            self.update_status(|status| {
                if on {
                    status | STATUS_RUNNING
                } else {
                    status & !STATUS_RUNNING
                }
            });
        } else {
            self.registers.insert(address, value);
        }
    }

    fn update_status(&mut self, f: impl FnOnce(i32) -> i32) {
        let address = Field::Status.descriptor().address;
        let status = self.registers.get(&address).copied().unwrap_or(0);
        self.registers.insert(address, f(status));
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    stats: TransportStats,
}

/// Transport answering from a [`RegisterFile`] without any socket
pub struct MemoryTransport {
    registers: Mutex<RegisterFile>,
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new(registers: RegisterFile) -> Self {
        Self {
            registers: Mutex::new(registers),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Inspect or modify the simulated registers
    pub async fn with_registers<R>(&self, f: impl FnOnce(&mut RegisterFile) -> R) -> R {
        let mut registers = self.registers.lock().await;
        f(&mut registers)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(RegisterFile::new())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Memory
    }

    async fn request(&self, command: Command) -> HuberResult<Option<i32>> {
        let mut state = self.state.lock().await;
        if !state.open {
            state.open = true;
            state.stats.connects += 1;
        }
        state.stats.requests += 1;

        let response = self.registers.lock().await.respond(command);
        match response {
            Some(line) => {
                state.stats.consecutive_timeouts = 0;
                command.parse_response(&line)
            }
            None => {
                debug!("Simulated bath ignored {}", command);
                state.stats.timeouts += 1;
                state.stats.consecutive_timeouts += 1;
                Ok(None)
            }
        }
    }

    async fn connect(&self) -> HuberResult<()> {
        let mut state = self.state.lock().await;
        if !state.open {
            state.open = true;
            state.stats.connects += 1;
        }
        Ok(())
    }

    async fn close(&self) {
        self.state.lock().await.open = false;
    }

    async fn is_open(&self) -> bool {
        self.state.lock().await.open
    }

    async fn stats(&self) -> TransportStats {
        let state = self.state.lock().await;
        TransportStats {
            is_open: state.open,
            ..state.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::HuberError;

    #[test]
    fn test_read_and_write() {
        let mut registers = RegisterFile::new();
        let setpoint = Field::TemperatureSetpoint.descriptor().address;

        assert_eq!(
            registers.respond(Command::read(setpoint)).as_deref(),
            Some("{S001388\r\n")
        );
        assert_eq!(
            registers.respond(Command::write(setpoint, -1000)).as_deref(),
            Some("{S00FC18\r\n")
        );
        assert_eq!(registers.get(Field::TemperatureSetpoint), Some(-1000));
        assert_eq!(registers.received().len(), 2);
    }

    #[test]
    fn test_unknown_register() {
        let mut registers = RegisterFile::new();
        assert_eq!(
            registers.respond(Command::read(0x7E)).as_deref(),
            Some("{S7E7FFF\r\n")
        );
    }

    #[test]
    fn test_start_sets_status_bits() {
        let mut registers = RegisterFile::new();
        registers.respond(Command::write(Field::On.descriptor().address, 1));
        assert_eq!(registers.get(Field::Status), Some(STATUS_RUNNING));

        registers.respond(Command::write(Field::On.descriptor().address, 0));
        assert_eq!(registers.get(Field::Status), Some(0));
    }

    #[test]
    fn test_clear_fault() {
        let mut registers = RegisterFile::new();
        registers.raise_fault(Field::Warning, -101);
        assert_eq!(registers.get(Field::Status), Some(STATUS_WARNING));

        let line = registers.respond(Command::write(Field::Warning.descriptor().address, 1));
        assert_eq!(line.as_deref(), Some("{S060000\r\n"));
        assert_eq!(registers.get(Field::Status), Some(0));
    }

    #[test]
    fn test_silent_registers() {
        let mut registers = RegisterFile::new();
        registers.set_silent(true);
        assert!(registers.respond(Command::read(0x00)).is_none());
        assert_eq!(registers.received().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_transport() {
        let transport = MemoryTransport::default();
        assert!(!transport.is_open().await);

        assert_eq!(transport.request(Command::read(0x00)).await.unwrap(), Some(5000));
        assert!(transport.is_open().await);

        transport.with_registers(|r| r.remove(Field::TemperatureProcess)).await;
        assert!(matches!(
            transport.request(Command::read(0x07)).await,
            Err(HuberError::DeviceNotSupported)
        ));

        transport.with_registers(|r| r.set_silent(true)).await;
        assert_eq!(transport.request(Command::read(0x00)).await.unwrap(), None);

        let stats = transport.stats().await;
        assert_eq!(stats.requests, 3);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.connects, 1);

        transport.close().await;
        assert!(!transport.is_open().await);
    }
}
