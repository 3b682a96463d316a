// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Configuration, DataHandler};
use crate::error::SensorError;

/// Sensor kinds supported by sensekit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Pedometer,      // Step counting
    Accelerometer,  // Linear acceleration, in g
    Altimeter,      // Relative altitude and barometric pressure
}

impl SensorType {
    /// Every supported sensor kind
    pub const ALL: [SensorType; 3] = [
        SensorType::Pedometer,
        SensorType::Accelerometer,
        SensorType::Altimeter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SensorType::Pedometer => "pedometer",
            SensorType::Accelerometer => "accelerometer",
            SensorType::Altimeter => "altimeter",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SensorType::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| format!("unknown sensor type '{}'", s))
    }
}

/// Uniform contract implemented by every concrete sensor.
///
/// All methods take `&self`: a stop may be issued from one task while a start
/// is still acquiring its backend on another.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Kind of sensor, fixed at construction
    fn sensor_type(&self) -> SensorType;

    /// Whether the backend reports this sensor as present on the host
    fn is_available(&self) -> bool;

    /// True between a successful start and the next stop
    fn is_sensing(&self) -> bool;

    /// Copy of the current configuration
    fn configuration(&self) -> Configuration;

    /// Replace the configuration. Only permitted while idle.
    fn set_configuration(&self, configuration: Configuration) -> Result<(), SensorError>;

    /// Add a handler; subscribing the same handler twice is a no-op
    fn subscribe_handler(&self, handler: &DataHandler);

    /// Remove a handler if present
    fn unsubscribe_handler(&self, handler: &DataHandler);

    fn unsubscribe_all_handlers(&self);

    fn subscriber_count(&self) -> usize;

    /// Acquire the backend and begin delivering readings
    async fn start_sensing(&self) -> Result<(), SensorError>;

    /// Release the backend; no readings are delivered once this returns
    async fn stop_sensing(&self) -> Result<(), SensorError>;
}
