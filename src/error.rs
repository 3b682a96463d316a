// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Error types shared by sensors, backends and the manager

use thiserror::Error;

use crate::sensors::SensorType;

/// Errors reported by a platform backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the sensing API.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The host does not expose this sensor.
    #[error("{0} sensor is not available on this host")]
    Unavailable(SensorType),

    /// Configuration of the wrong type, or with out-of-range values.
    #[error("invalid {sensor_type} configuration: {reason}")]
    InvalidConfiguration {
        sensor_type: SensorType,
        reason: String,
    },

    #[error("{0} sensor is already sensing")]
    AlreadySensing(SensorType),

    /// Operation not permitted in the sensor's current lifecycle phase.
    #[error("{sensor_type} sensor: {reason}")]
    InvalidState {
        sensor_type: SensorType,
        reason: &'static str,
    },

    #[error("{sensor_type} backend failed to start")]
    BackendStartFailure {
        sensor_type: SensorType,
        #[source]
        source: BackendError,
    },

    #[error("{sensor_type} backend failed to stop")]
    BackendStopFailure {
        sensor_type: SensorType,
        #[source]
        source: BackendError,
    },

    /// A stop arrived while the backend was still being acquired.
    #[error("start of {0} sensor was cancelled by a concurrent stop")]
    StartCancelled(SensorType),

    #[error("{0} sensor is already registered")]
    AlreadyRegistered(SensorType),

    #[error("{0} sensor is not registered")]
    NotRegistered(SensorType),
}

impl SensorError {
    pub(crate) fn invalid_configuration(sensor_type: SensorType, reason: impl Into<String>) -> Self {
        SensorError::InvalidConfiguration {
            sensor_type,
            reason: reason.into(),
        }
    }

    /// Sensor type the error refers to.
    pub fn sensor_type(&self) -> SensorType {
        match self {
            SensorError::Unavailable(t)
            | SensorError::AlreadySensing(t)
            | SensorError::StartCancelled(t)
            | SensorError::AlreadyRegistered(t)
            | SensorError::NotRegistered(t) => *t,
            SensorError::InvalidConfiguration { sensor_type, .. }
            | SensorError::InvalidState { sensor_type, .. }
            | SensorError::BackendStartFailure { sensor_type, .. }
            | SensorError::BackendStopFailure { sensor_type, .. } => *sensor_type,
        }
    }
}
