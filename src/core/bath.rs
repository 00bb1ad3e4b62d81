// Bath module - typed property access over a transport
use crate::core::codec::{decode_field, encode_field, FieldValue};
use crate::core::communication::frame::Command;
use crate::core::communication::transport::Transport;
use crate::core::snapshot::Snapshot;
use crate::domain::config::ConnectionConfig;
use crate::domain::error::{HuberError, HuberResult};
use crate::domain::fault::FaultRecord;
use crate::domain::field::{Field, FieldFormat};
use crate::infrastructure::tcp::TcpClient;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Maximum difference between a written value and its echo
pub const WRITE_TOLERANCE: f64 = 0.1;

/// Status flags that have a matching fault register
const FAULT_FLAGS: [(&str, Field); 2] = [("warning", Field::Warning), ("error", Field::Error)];

/// Get/set/snapshot contract shared by every bath backend
#[async_trait]
pub trait BathControl: Send + Sync {
    /// Read one field; `Ok(None)` when the bath did not answer
    async fn get(&self, field: Field) -> HuberResult<Option<FieldValue>>;

    /// Write one field and verify the echo
    async fn set(&self, field: Field, value: f64) -> HuberResult<()>;

    /// Read the default fields, plus active fault details
    async fn snapshot(&self) -> HuberResult<Snapshot>;

    /// Release the connection
    async fn close(&self);

    /// Read a field by dotted path
    async fn get_path(&self, path: &str) -> HuberResult<Option<FieldValue>> {
        self.get(path.parse()?).await
    }

    /// Write a field by dotted path
    async fn set_path(&self, path: &str, value: f64) -> HuberResult<()> {
        self.set(path.parse()?, value).await
    }

    /// Start the controller and pump
    async fn start(&self) -> HuberResult<()> {
        self.set(Field::On, 1.0).await
    }

    /// Stop the controller and pump
    async fn stop(&self) -> HuberResult<()> {
        self.set(Field::On, 0.0).await
    }

    async fn toggle(&self, on: bool) -> HuberResult<()> {
        self.set(Field::On, f64::from(u8::from(on))).await
    }

    /// Temperature setpoint, in °C
    async fn get_setpoint(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::TemperatureSetpoint).await?.and_then(|v| v.as_f64()))
    }

    async fn set_setpoint(&self, value: f64) -> HuberResult<()> {
        self.set(Field::TemperatureSetpoint, value).await
    }

    /// Internal bath temperature, in °C
    async fn get_bath_temperature(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::TemperatureBath).await?.and_then(|v| v.as_f64()))
    }

    /// Temperature of the optional external process sensor, in °C
    async fn get_process_temperature(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::TemperatureProcess).await?.and_then(|v| v.as_f64()))
    }

    /// Pump outlet pressure, in mbar
    async fn get_pump_pressure(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::PumpPressure).await?.and_then(|v| v.as_f64()))
    }

    /// Pump speed, in RPM
    async fn get_pump_speed(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::PumpSpeed).await?.and_then(|v| v.as_f64()))
    }

    async fn get_pump_setpoint(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::PumpSetpoint).await?.and_then(|v| v.as_f64()))
    }

    /// Set the pump speed setpoint, in RPM
    async fn set_pump_speed(&self, value: f64) -> HuberResult<()> {
        self.set(Field::PumpSetpoint, value).await
    }

    /// Thermal fluid fill level, in [0, 1]
    async fn get_fill_level(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::Fill).await?.and_then(|v| v.as_f64()))
    }

    /// Days until the next maintenance alarm
    async fn get_next_maintenance(&self) -> HuberResult<Option<f64>> {
        Ok(self.get(Field::Maintenance).await?.and_then(|v| v.as_f64()))
    }

    async fn get_status(&self) -> HuberResult<Option<BTreeMap<&'static str, bool>>> {
        Ok(match self.get(Field::Status).await? {
            Some(FieldValue::Flags(flags)) => Some(flags),
            _ => None,
        })
    }

    /// Most recent error, if one is latched
    async fn get_error(&self) -> HuberResult<Option<FaultRecord>> {
        Ok(self.get(Field::Error).await?.and_then(|v| v.as_fault().cloned()))
    }

    /// Most recent warning, if one is latched
    async fn get_warning(&self) -> HuberResult<Option<FaultRecord>> {
        Ok(self.get(Field::Warning).await?.and_then(|v| v.as_fault().cloned()))
    }

    async fn clear_error(&self) -> HuberResult<()> {
        self.set(Field::Error, 1.0).await
    }

    async fn clear_warning(&self) -> HuberResult<()> {
        self.set(Field::Warning, 1.0).await
    }
}

/// Driver for one Huber bath
pub struct Bath<T: Transport = TcpClient> {
    transport: T,
}

impl Bath<TcpClient> {
    /// Driver for the bath at `host`, default port; connects on first use
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_config(ConnectionConfig::for_host(host))
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        Self::with_transport(TcpClient::new(config))
    }

    /// Driver with the connection opened up front; fails if the bath is unreachable
    pub async fn connect(config: ConnectionConfig) -> HuberResult<Self> {
        let bath = Self::with_config(config);
        bath.transport.connect().await?;
        Ok(bath)
    }
}

impl<T: Transport> Bath<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn read(&self, field: Field) -> HuberResult<Option<FieldValue>> {
        let descriptor = field.descriptor();
        let raw = self.transport.request(Command::read(descriptor.address)).await?;
        let value = decode_field(raw, descriptor);

        if let (Some((min, max)), Some(number)) =
            (descriptor.range, value.as_ref().and_then(FieldValue::as_f64))
        {
            if !descriptor.contains(number) {
                return Err(HuberError::OutOfRange {
                    field: field.path().to_string(),
                    value: number,
                    min,
                    max,
                });
            }
        }

        debug!("{} = {:?}", field, value);
        Ok(value)
    }

    async fn write(&self, field: Field, value: f64) -> HuberResult<()> {
        let descriptor = field.descriptor();
        if !descriptor.writable {
            return Err(HuberError::NotWritable {
                field: field.path().to_string(),
            });
        }
        if let Some((min, max)) = descriptor.range {
            if !descriptor.contains(value) {
                return Err(HuberError::OutOfRange {
                    field: field.path().to_string(),
                    value,
                    min,
                    max,
                });
            }
        }

        let raw = encode_field(field, value)?;
        let echo = self
            .transport
            .request(Command::write(descriptor.address, raw))
            .await?
            .ok_or_else(|| HuberError::NoResponse {
                field: field.path().to_string(),
            })?;

        match descriptor.format {
            // Booleans echo 0/1 and fault registers echo the cleared state
            FieldFormat::Bool | FieldFormat::Fault => {}
            _ => {
                let received = decode_field(Some(echo), descriptor)
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| HuberError::NoResponse {
                        field: field.path().to_string(),
                    })?;
                if (received - value).abs() > WRITE_TOLERANCE {
                    return Err(HuberError::WriteVerification {
                        field: field.path().to_string(),
                        requested: value,
                        received,
                    });
                }
            }
        }

        info!("Set {} to {}", field, value);
        Ok(())
    }

    async fn read_snapshot(&self) -> HuberResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut status = None;

        for field in Field::DEFAULTS {
            let value = self.read(field).await?;
            snapshot.insert(field.path(), &value)?;
            if field == Field::Status {
                status = value;
            }
        }

        if let Some(status) = status {
            for (flag, field) in FAULT_FLAGS {
                if status.flag(flag) {
                    snapshot.insert(field.path(), self.read(field).await?)?;
                }
            }
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl<T: Transport> BathControl for Bath<T> {
    async fn get(&self, field: Field) -> HuberResult<Option<FieldValue>> {
        self.read(field).await
    }

    async fn set(&self, field: Field, value: f64) -> HuberResult<()> {
        self.write(field, value).await
    }

    async fn snapshot(&self) -> HuberResult<Snapshot> {
        self.read_snapshot().await
    }

    async fn close(&self) {
        self.transport.close().await;
    }
}
