// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Per-sensor-type configuration values

use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SensorType;
use crate::error::SensorError;

/// Highest accelerometer sample rate a backend is asked for, in Hz
pub const MAX_ACCELEROMETER_RATE: f64 = 100.0;

/// Lowest accelerometer sample rate, in Hz (one sample every 100 s)
pub const MIN_ACCELEROMETER_RATE: f64 = 0.01;

/// Longest pedometer update interval, in milliseconds (one hour)
pub const MAX_PEDOMETER_INTERVAL_MS: u64 = 3_600_000;

/// A configuration subtype bound to exactly one sensor type.
pub trait SensorConfiguration: Clone + Debug + Send + Sync + 'static {
    const SENSOR_TYPE: SensorType;

    /// Reject out-of-range values
    fn validate(&self) -> Result<(), SensorError> {
        Ok(())
    }

    fn into_configuration(self) -> Configuration;

    /// Unwrap the matching variant, or fail with `InvalidConfiguration`
    fn try_from_configuration(configuration: Configuration) -> Result<Self, SensorError>;
}

/// Pedometer tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedometerConfiguration {
    /// Interval between cumulative step updates, in milliseconds
    pub update_interval_ms: u64,
}

impl PedometerConfiguration {
    /// Interval rounded up to whole milliseconds, saturating at `u64::MAX`
    pub fn with_interval(interval: Duration) -> Self {
        let millis = interval.as_micros().div_ceil(1000);
        Self {
            update_interval_ms: u64::try_from(millis).unwrap_or(u64::MAX),
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

impl Default for PedometerConfiguration {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000,
        }
    }
}

/// Accelerometer tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerometerConfiguration {
    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl AccelerometerConfiguration {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self { sample_rate }
    }

    /// Time between two samples at the configured rate
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate)
    }
}

impl Default for AccelerometerConfiguration {
    fn default() -> Self {
        Self { sample_rate: 10.0 }
    }
}

/// The altimeter has no tunables; the backend decides its own cadence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltimeterConfiguration {}

impl SensorConfiguration for PedometerConfiguration {
    const SENSOR_TYPE: SensorType = SensorType::Pedometer;

    fn validate(&self) -> Result<(), SensorError> {
        if self.update_interval_ms == 0 {
            return Err(SensorError::invalid_configuration(
                Self::SENSOR_TYPE,
                "update interval must be positive",
            ));
        }
        if self.update_interval_ms > MAX_PEDOMETER_INTERVAL_MS {
            return Err(SensorError::invalid_configuration(
                Self::SENSOR_TYPE,
                format!(
                    "update interval {} ms exceeds the {} ms maximum",
                    self.update_interval_ms, MAX_PEDOMETER_INTERVAL_MS
                ),
            ));
        }
        Ok(())
    }

    fn into_configuration(self) -> Configuration {
        Configuration::Pedometer(self)
    }

    fn try_from_configuration(configuration: Configuration) -> Result<Self, SensorError> {
        match configuration {
            Configuration::Pedometer(c) => Ok(c),
            other => Err(mismatch(Self::SENSOR_TYPE, &other)),
        }
    }
}

impl SensorConfiguration for AccelerometerConfiguration {
    const SENSOR_TYPE: SensorType = SensorType::Accelerometer;

    fn validate(&self) -> Result<(), SensorError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SensorError::invalid_configuration(
                Self::SENSOR_TYPE,
                format!("sample rate must be positive, got {}", self.sample_rate),
            ));
        }
        if self.sample_rate < MIN_ACCELEROMETER_RATE {
            return Err(SensorError::invalid_configuration(
                Self::SENSOR_TYPE,
                format!(
                    "sample rate {} Hz is below the {} Hz minimum",
                    self.sample_rate, MIN_ACCELEROMETER_RATE
                ),
            ));
        }
        if self.sample_rate > MAX_ACCELEROMETER_RATE {
            return Err(SensorError::invalid_configuration(
                Self::SENSOR_TYPE,
                format!(
                    "sample rate {} Hz exceeds the {} Hz maximum",
                    self.sample_rate, MAX_ACCELEROMETER_RATE
                ),
            ));
        }
        Ok(())
    }

    fn into_configuration(self) -> Configuration {
        Configuration::Accelerometer(self)
    }

    fn try_from_configuration(configuration: Configuration) -> Result<Self, SensorError> {
        match configuration {
            Configuration::Accelerometer(c) => Ok(c),
            other => Err(mismatch(Self::SENSOR_TYPE, &other)),
        }
    }
}

impl SensorConfiguration for AltimeterConfiguration {
    const SENSOR_TYPE: SensorType = SensorType::Altimeter;

    fn into_configuration(self) -> Configuration {
        Configuration::Altimeter(self)
    }

    fn try_from_configuration(configuration: Configuration) -> Result<Self, SensorError> {
        match configuration {
            Configuration::Altimeter(c) => Ok(c),
            other => Err(mismatch(Self::SENSOR_TYPE, &other)),
        }
    }
}

fn mismatch(expected: SensorType, found: &Configuration) -> SensorError {
    SensorError::invalid_configuration(
        expected,
        format!("expected a {} configuration, got {}", expected, found.sensor_type()),
    )
}

/// Configuration of any sensor type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "lowercase")]
pub enum Configuration {
    Pedometer(PedometerConfiguration),
    Accelerometer(AccelerometerConfiguration),
    Altimeter(AltimeterConfiguration),
}

impl Configuration {
    pub fn sensor_type(&self) -> SensorType {
        match self {
            Configuration::Pedometer(_) => SensorType::Pedometer,
            Configuration::Accelerometer(_) => SensorType::Accelerometer,
            Configuration::Altimeter(_) => SensorType::Altimeter,
        }
    }

    pub fn validate(&self) -> Result<(), SensorError> {
        match self {
            Configuration::Pedometer(c) => c.validate(),
            Configuration::Accelerometer(c) => c.validate(),
            Configuration::Altimeter(c) => c.validate(),
        }
    }
}
