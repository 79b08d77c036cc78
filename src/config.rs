// src/config.rs
//! Configuration management with JSON file storage

use crate::error::{GnssError, Result};
use crate::scatter::CenterMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// "serial" or "tcp"
    pub source_type: String,
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub tcp_host: Option<String>,
    pub tcp_port: Option<u16>,
    /// Include zero-signal satellites in the visible list
    #[serde(default)]
    pub show_zero: bool,
    /// Satellite visibility window in seconds
    #[serde(default = "default_sat_expiry")]
    pub sat_expiry_secs: u64,
    /// Emit trackpoints from fix sentences
    #[serde(default)]
    pub record_track: bool,
    /// GPX output path for recorded tracks
    #[serde(default)]
    pub track_file: Option<String>,
    #[serde(default)]
    pub scatter: ScatterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterConfig {
    /// Fixed reference position; 0.0/0.0 means unset
    pub reference_lat: f64,
    pub reference_lon: f64,
    pub autorange: bool,
    pub scale_index: usize,
    pub center_mode: CenterMode,
    pub max_points: usize,
}

fn default_sat_expiry() -> u64 {
    10
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            reference_lat: 0.0,
            reference_lon: 0.0,
            autorange: true,
            scale_index: 9,
            center_mode: CenterMode::Average,
            max_points: crate::scatter::MAX_POINTS,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_type: "serial".to_string(),
            serial_port: None,
            serial_baudrate: Some(9600),
            tcp_host: Some("localhost".to_string()),
            tcp_port: Some(2947),
            show_zero: false,
            sat_expiry_secs: default_sat_expiry(),
            record_track: false,
            track_file: None,
            scatter: ScatterConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from storage, falling back to defaults when no
    /// config file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| GnssError::Other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GnssError::Other(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to storage.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GnssError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| GnssError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| GnssError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GnssError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gnss-monitor")
            .join("config.json"))
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update TCP feed settings
    pub fn update_tcp(&mut self, host: String, port: u16) {
        self.source_type = "tcp".to_string();
        self.tcp_host = Some(host);
        self.tcp_port = Some(port);
    }
}
