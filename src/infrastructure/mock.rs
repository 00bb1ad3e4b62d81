use crate::core::bath::BathControl;
use crate::core::codec::FieldValue;
use crate::core::snapshot::Snapshot;
use crate::domain::error::{HuberError, HuberResult};
use crate::domain::field::Field;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
struct MockState {
    temp_setpoint: f64,
    pump_setpoint: i32,
    on: bool,
}

/// Offline bath backend returning synthetic readings.
///
/// Setpoints and the on/off state are remembered; everything else is
/// random within the bath's real ranges. Faults are never reported.
pub struct MockBath {
    state: Mutex<MockState>,
    max_latency: Duration,
}

impl MockBath {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                temp_setpoint: 50.0,
                pump_setpoint: 500,
                on: false,
            }),
            max_latency: Duration::from_millis(250),
        }
    }

    /// Upper bound of the simulated response time
    pub fn with_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    async fn latency(&self) {
        if self.max_latency.is_zero() {
            return;
        }
        let delay = self.max_latency.mul_f64(rand::random::<f64>());
        tokio::time::sleep(delay).await;
    }

    fn value_of(field: Field, state: &MockState) -> Option<FieldValue> {
        let mut rng = rand::thread_rng();
        match field {
            Field::On => Some(FieldValue::Bool(state.on)),
            Field::TemperatureSetpoint => Some(FieldValue::Decimal(state.temp_setpoint)),
            Field::TemperatureBath => Some(FieldValue::Decimal(23.49)),
            Field::TemperatureProcess => Some(FieldValue::Decimal(22.71)),
            Field::PumpPressure => Some(FieldValue::Decimal(rng.gen_range(0.0..320.0))),
            Field::PumpSpeed => Some(FieldValue::Integer(rng.gen_range(0..1000))),
            Field::PumpSetpoint => Some(FieldValue::Integer(state.pump_setpoint)),
            Field::Fill => Some(FieldValue::Decimal(rng.gen::<f64>())),
            Field::Maintenance => Some(FieldValue::Integer(rng.gen_range(0..=365))),
            Field::Status => Some(FieldValue::Flags(
                [
                    ("circulating", rng.gen::<bool>()),
                    ("controlling", rng.gen::<bool>()),
                    ("error", false),
                    ("pumping", rng.gen::<bool>()),
                    ("warning", false),
                ]
                .into_iter()
                .collect(),
            )),
            Field::Error | Field::Warning => None,
        }
    }
}

impl Default for MockBath {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BathControl for MockBath {
    async fn get(&self, field: Field) -> HuberResult<Option<FieldValue>> {
        self.latency().await;
        let state = self.state.lock().await;
        Ok(Self::value_of(field, &state))
    }

    async fn set(&self, field: Field, value: f64) -> HuberResult<()> {
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

        self.latency().await;
        let mut state = self.state.lock().await;
        match field {
            Field::On => state.on = value != 0.0,
            Field::TemperatureSetpoint => state.temp_setpoint = value,
            Field::PumpSetpoint => state.pump_setpoint = value.round() as i32,
            _ => {}
        }
        debug!("Mock bath set {} to {}", field, value);
        Ok(())
    }

    async fn snapshot(&self) -> HuberResult<Snapshot> {
        self.latency().await;
        let state = self.state.lock().await.clone();

        let mut snapshot = Snapshot::new();
        for field in Field::DEFAULTS
            .into_iter()
            .chain(std::iter::once(Field::TemperatureProcess))
        {
            snapshot.insert(field.path(), Self::value_of(field, &state))?;
        }
        Ok(snapshot)
    }

    async fn close(&self) {
        debug!("Mock bath closed");
    }
}
