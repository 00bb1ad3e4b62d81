use crate::cli::args::Args;
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::bath::{Bath, BathControl};
use crate::core::snapshot::Snapshot;
use crate::domain::config::{ConnectionConfig, HuberConfig};
use crate::domain::error::{HuberError, HuberResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::mock::MockBath;
use crate::infrastructure::simulator::RegisterFile;
use crate::infrastructure::tcp::DeviceSimulator;
use tracing::info;

/// Load the configuration file named on the command line, or the user's one
pub fn load_config(args: &Args) -> HuberResult<HuberConfig> {
    let config_manager = ConfigManager::new();
    match &args.config {
        Some(path) => config_manager.load_config_from_path(path.as_ref()),
        None => config_manager.load_config(),
    }
}

/// Merge command line overrides into the connection settings
pub fn connection_config(args: &Args, config: &HuberConfig) -> ConnectionConfig {
    let mut connection = config.connection.clone();
    if let Some(host) = &args.host {
        connection.host = host.clone();
    }
    if let Some(port) = args.port {
        connection.port = port;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        connection.timeout_ms = timeout_ms;
    }
    connection
}

/// Apply requested setpoints, then read a full snapshot
pub async fn run(args: &Args, bath: &dyn BathControl) -> HuberResult<Snapshot> {
    if let Some(setpoint) = args.set_setpoint {
        bath.set_setpoint(setpoint).await?;
    }
    if let Some(speed) = args.set_pump_speed {
        bath.set_pump_speed(speed).await?;
    }
    bath.snapshot().await
}

/// Execute CLI command
pub async fn execute_command(args: Args, config: HuberConfig) -> HuberResult<()> {
    let writer = ConsoleWriter::new(args.output);
    let snapshot = snapshot_for(&args, &config).await?;
    writer.write_snapshot(&snapshot)?;
    Ok(())
}

async fn snapshot_for(args: &Args, config: &HuberConfig) -> HuberResult<Snapshot> {
    if args.mock {
        let bath = MockBath::new();
        return run(args, &bath).await;
    }

    let mut connection = connection_config(args, config);
    let mut simulator = None;
    if args.simulate {
        let mut device = DeviceSimulator::new("127.0.0.1:0", RegisterFile::new()).await?;
        device.start().await?;
        connection.host = device.get_bind_addr().ip().to_string();
        connection.port = device.get_bind_addr().port();
        simulator = Some(device);
    }

    if connection.host.is_empty() {
        return Err(HuberError::InvalidInput(
            "No bath host given on the command line or in the configuration".to_string(),
        ));
    }

    info!("Connecting to bath at {}", connection.address());
    let bath = Bath::connect(connection).await?;
    let result = run(args, &bath).await;
    bath.close().await;

    if let Some(mut device) = simulator {
        device.stop().await?;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_connection_overrides() {
        let args = Args::try_parse_from(["huber", "10.1.1.1", "-p", "9100", "--timeout-ms", "500"]).unwrap();
        let mut config = HuberConfig::default();
        config.connection.host = "10.0.0.1".to_string();
        config.connection.max_timeouts = 4;

        let connection = connection_config(&args, &config);
        assert_eq!(connection.host, "10.1.1.1");
        assert_eq!(connection.port, 9100);
        assert_eq!(connection.timeout_ms, 500);
        assert_eq!(connection.max_timeouts, 4);
    }

    #[test]
    fn test_host_from_config() {
        let args = Args::try_parse_from(["huber"]).unwrap();
        let mut config = HuberConfig::default();
        config.connection.host = "bath.lab".to_string();
        assert_eq!(connection_config(&args, &config).host, "bath.lab");
    }

    #[tokio::test]
    async fn test_mock_run_with_setpoint() {
        let args = Args::try_parse_from(["huber", "fakeip", "--mock", "--set-setpoint", "1.23"]).unwrap();
        let bath = MockBath::new().with_latency(std::time::Duration::ZERO);
        let snapshot = run(&args, &bath).await.unwrap();
        assert_eq!(snapshot.get("temperature.setpoint"), Some(&serde_json::json!(1.23)));
    }

    #[tokio::test]
    async fn test_simulated_run() {
        let args = Args::try_parse_from(["huber", "--simulate", "--set-pump-speed", "2000"]).unwrap();
        let snapshot = snapshot_for(&args, &HuberConfig::default()).await.unwrap();
        assert_eq!(snapshot.get("pump.setpoint"), Some(&serde_json::json!(2000)));
        assert_eq!(snapshot.get("on"), Some(&serde_json::json!(false)));
    }

    #[tokio::test]
    async fn test_missing_host() {
        let args = Args::try_parse_from(["huber"]).unwrap();
        let result = snapshot_for(&args, &HuberConfig::default()).await;
        assert!(matches!(result, Err(HuberError::InvalidInput(_))));
    }
}
