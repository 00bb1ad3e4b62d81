use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TCP port of the bath's network interface
pub const DEFAULT_PORT: u16 = 8101;

/// Huber driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuberConfig {
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Bath host name or IP address
    #[serde(default)]
    pub host: String,
    /// Bath TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect and read timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Consecutive read timeouts before an error is logged
    #[serde(default = "default_max_timeouts")]
    pub max_timeouts: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    250
}

fn default_max_timeouts() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConnectionConfig {
    /// Connection settings for a host with every other value defaulted
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `host:port` as passed to the socket layer
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            timeout_ms: default_timeout(),
            max_timeouts: default_max_timeouts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = HuberConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: HuberConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.connection.port, DEFAULT_PORT);
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: HuberConfig = toml::from_str(
            r#"
            [connection]
            host = "192.168.1.40"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.host, "192.168.1.40");
        assert_eq!(config.connection.port, 8101);
        assert_eq!(config.connection.timeout(), Duration::from_millis(250));
        assert_eq!(config.connection.max_timeouts, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_address() {
        let config = ConnectionConfig::for_host("bath.local");
        assert_eq!(config.address(), "bath.local:8101");
    }
}
