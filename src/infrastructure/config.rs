use crate::domain::{config::HuberConfig, error::{HuberError, HuberResult}};
use std::path::{Path, PathBuf};
use std::fs;

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
        }
    }

    /// Load the user configuration, or defaults when there is none
    pub fn load_config(&self) -> HuberResult<HuberConfig> {
        match &self.global_config_path {
            Some(path) if path.exists() => self.load_config_from_path(path),
            _ => Ok(HuberConfig::default()),
        }
    }

    /// Get global configuration path
    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("huber").join("config.toml"))
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> HuberResult<HuberConfig> {
        let content = fs::read_to_string(path).map_err(|e| HuberError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| HuberError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_global_path_location() {
        if let Some(path) = ConfigManager::new().global_config_path {
            assert!(path.ends_with("huber/config.toml"));
        }
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[connection]\nhost = \"192.168.10.20\"\ntimeout_ms = 500\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let loaded = ConfigManager::new().load_config_from_path(&path).unwrap();
        assert_eq!(loaded.connection.host, "192.168.10.20");
        assert_eq!(loaded.connection.timeout_ms, 500);
        assert_eq!(loaded.connection.port, 8101);
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_missing_global_file_gives_defaults() {
        let manager = ConfigManager {
            global_config_path: Some(PathBuf::from("/nonexistent/huber/config.toml")),
        };
        let config = manager.load_config().unwrap();
        assert!(config.connection.host.is_empty());
        assert_eq!(config.connection.max_timeouts, 10);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[connection]\nport = \"eighty\"").unwrap();

        let result = ConfigManager::new().load_config_from_path(&path);
        assert!(matches!(result, Err(HuberError::Config { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigManager::new().load_config_from_path(&temp_dir.path().join("absent.toml"));
        assert!(result.is_err());
    }
}
