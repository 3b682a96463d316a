// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::sensors::{
    AccelerometerConfiguration, AltimeterConfiguration, Configuration, PedometerConfiguration,
    SensorConfiguration, SensorType,
};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Capacity of the reading and event broadcast channels
    pub event_bus_capacity: usize,

    /// How readings are printed
    pub output: OutputFormat,

    /// Sensor configuration
    pub sensors: SensorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            event_bus_capacity: 1024,
            output: OutputFormat::Log,
            sensors: SensorsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Check every sensor configuration and the bus capacity
    pub fn validate(&self) -> Result<()> {
        if self.event_bus_capacity == 0 {
            anyhow::bail!("event_bus_capacity must be at least 1");
        }
        self.sensors.pedometer.validate()?;
        self.sensors.accelerometer.validate()?;
        self.sensors.altimeter.validate()?;
        Ok(())
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("sensekit"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Which simulated sensors run, and how each is tuned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    /// Sensors to register
    pub enabled: Vec<SensorType>,

    /// Seed for simulated backends; random when absent
    pub seed: Option<u64>,

    pub pedometer: PedometerConfiguration,
    pub accelerometer: AccelerometerConfiguration,
    pub altimeter: AltimeterConfiguration,
}

impl SensorsConfig {
    /// Typed configuration for `sensor_type`
    pub fn configuration(&self, sensor_type: SensorType) -> Configuration {
        match sensor_type {
            SensorType::Pedometer => self.pedometer.clone().into_configuration(),
            SensorType::Accelerometer => self.accelerometer.clone().into_configuration(),
            SensorType::Altimeter => self.altimeter.clone().into_configuration(),
        }
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![SensorType::Pedometer],
            seed: None,
            pedometer: PedometerConfiguration::default(),
            accelerometer: AccelerometerConfiguration::default(),
            altimeter: AltimeterConfiguration::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One tracing line per reading
    Log,
    Csv,
    Json,
}
