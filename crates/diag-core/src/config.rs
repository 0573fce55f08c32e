use crate::error::{DiagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Top-level diagnostics configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    pub server: ServerConfig,
    pub camera: CameraConfig,
}

impl DiagConfig {
    /// Load configuration from default path (~/.config/flowstate-diag/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write current configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| DiagError::Config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowstate-diag")
            .join("config.toml")
    }

    /// Check values that serde alone cannot reject.
    pub fn validate(&self) -> Result<()> {
        let url = self.server.parsed_base_url()?;
        if url.cannot_be_a_base() {
            return Err(DiagError::Config(format!(
                "base_url '{}' cannot be used as a base URL",
                self.server.base_url
            )));
        }
        if self.server.user_id.trim().is_empty() {
            return Err(DiagError::Config("user_id must not be empty".into()));
        }
        if self.server.timeout_secs == 0 || self.server.pose_timeout_secs == 0 {
            return Err(DiagError::Config("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }
}

/// Connection settings for the pose server under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the server (e.g. "http://localhost:5001").
    pub base_url: String,
    /// User whose analytics are fetched.
    pub user_id: String,
    /// Timeout for the analytics request, in seconds.
    pub timeout_secs: u64,
    /// Timeout for the current-pose probe, in seconds.
    pub pose_timeout_secs: u64,
    /// Printed when the server cannot be reached.
    pub start_hint: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".into(),
            user_id: "default_user".into(),
            timeout_secs: 10,
            pose_timeout_secs: 5,
            start_hint: vec!["cd FlowState/".into(), "python3 app_with_data.py".into()],
        }
    }
}

impl ServerConfig {
    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| DiagError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn pose_timeout(&self) -> Duration {
        Duration::from_secs(self.pose_timeout_secs)
    }
}

/// Local camera probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index.
    pub device: i32,
    /// Number of frames to read.
    pub frames: u32,
    /// Pause between reads, in milliseconds (lets the sensor warm up).
    pub interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            frames: 5,
            interval_ms: 100,
        }
    }
}

impl CameraConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
