use clap::{Parser, ValueEnum};

/// Command line arguments for the Huber bath tool
#[derive(Parser, Debug)]
#[command(
    name = "huber",
    version = env!("CARGO_PKG_VERSION"),
    about = "Control a Huber bath from the command line.",
    long_about = "Reads the state of a Huber recirculating bath over its TCP interface, optionally changing the temperature or pump setpoint first."
)]
pub struct Args {
    /// The bath IP address or host name
    pub host: Option<String>,

    /// Set the bath temperature setpoint, in °C
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub set_setpoint: Option<f64>,

    /// Set the pump speed setpoint, in RPM
    #[arg(long)]
    pub set_pump_speed: Option<f64>,

    /// Bath TCP port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect and read timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use the offline mock bath instead of a device
    #[arg(long, conflicts_with = "simulate")]
    pub mock: bool,

    /// Talk to a local simulated bath over TCP
    #[arg(long)]
    pub simulate: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON with sorted keys
    Json,
    /// One `path: value` line per field
    Text,
    /// Table output
    Table,
}

impl Args {
    /// Log level requested on the command line, if any
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_and_setpoint() {
        let args = Args::try_parse_from(["huber", "192.168.1.50", "--set-setpoint", "1.23"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("192.168.1.50"));
        assert_eq!(args.set_setpoint, Some(1.23));
        assert_eq!(args.output, OutputFormat::Json);
        assert!(!args.mock);
    }

    #[test]
    fn test_parse_negative_setpoint() {
        let args = Args::try_parse_from(["huber", "bath", "-s", "-20.5"]).unwrap();
        assert_eq!(args.set_setpoint, Some(-20.5));
    }

    #[test]
    fn test_mock_conflicts_with_simulate() {
        assert!(Args::try_parse_from(["huber", "--mock", "--simulate"]).is_err());
    }

    #[test]
    fn test_output_and_flags() {
        let args = Args::try_parse_from(["huber", "--mock", "-o", "table", "-v", "-p", "9000"]).unwrap();
        assert_eq!(args.output, OutputFormat::Table);
        assert_eq!(args.log_level(), Some("debug"));
        assert_eq!(args.port, Some(9000));
        assert!(args.host.is_none());
    }
}
