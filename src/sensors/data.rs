// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Readings produced by sensors

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::SensorType;

/// Cumulative pedometer update, counted from the start of the sensing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedometerData {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub number_of_steps: u64,
    /// Metres
    pub distance: Option<f64>,
    pub floors_ascended: Option<u32>,
    pub floors_descended: Option<u32>,
    /// Seconds per metre
    pub current_pace: Option<f64>,
    /// Steps per second
    pub current_cadence: Option<f64>,
    pub average_active_pace: Option<f64>,
}

impl PedometerData {
    pub fn steps(start_date: DateTime<Utc>, end_date: DateTime<Utc>, number_of_steps: u64) -> Self {
        Self {
            start_date,
            end_date,
            number_of_steps,
            distance: None,
            floors_ascended: None,
            floors_descended: None,
            current_pace: None,
            current_cadence: None,
            average_active_pace: None,
        }
    }
}

/// Acceleration along each device axis, in g
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelerometerData {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltimeterData {
    /// Metres relative to the altitude when sensing started
    pub relative_altitude: f64,
    /// Kilopascals
    pub pressure: f64,
}

/// Backend-specific body of a reading, one shape per sensor type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SensorPayload {
    Pedometer(PedometerData),
    Accelerometer(AccelerometerData),
    Altimeter(AltimeterData),
}

impl SensorPayload {
    pub fn sensor_type(&self) -> SensorType {
        match self {
            SensorPayload::Pedometer(_) => SensorType::Pedometer,
            SensorPayload::Accelerometer(_) => SensorType::Accelerometer,
            SensorPayload::Altimeter(_) => SensorType::Altimeter,
        }
    }
}

impl From<PedometerData> for SensorPayload {
    fn from(data: PedometerData) -> Self {
        SensorPayload::Pedometer(data)
    }
}

impl From<AccelerometerData> for SensorPayload {
    fn from(data: AccelerometerData) -> Self {
        SensorPayload::Accelerometer(data)
    }
}

impl From<AltimeterData> for SensorPayload {
    fn from(data: AltimeterData) -> Self {
        SensorPayload::Altimeter(data)
    }
}

/// A single immutable reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    sensor_type: SensorType,
    timestamp: DateTime<Utc>,
    payload: SensorPayload,
}

impl SensorData {
    /// Stamp a payload with the current time
    pub fn new(payload: impl Into<SensorPayload>) -> Self {
        Self::with_timestamp(payload, Utc::now())
    }

    pub fn with_timestamp(payload: impl Into<SensorPayload>, timestamp: DateTime<Utc>) -> Self {
        let payload = payload.into();
        Self {
            sensor_type: payload.sensor_type(),
            timestamp,
            payload,
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &SensorPayload {
        &self.payload
    }

    pub fn as_pedometer(&self) -> Option<&PedometerData> {
        match &self.payload {
            SensorPayload::Pedometer(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_accelerometer(&self) -> Option<&AccelerometerData> {
        match &self.payload {
            SensorPayload::Accelerometer(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_altimeter(&self) -> Option<&AltimeterData> {
        match &self.payload {
            SensorPayload::Altimeter(d) => Some(d),
            _ => None,
        }
    }

    /// CSV column names for readings of `sensor_type`
    pub fn csv_header(sensor_type: SensorType) -> &'static str {
        match sensor_type {
            SensorType::Pedometer => {
                "timestamp,start_date,end_date,number_of_steps,distance,floors_ascended,\
                 floors_descended,current_pace,current_cadence,average_active_pace"
            }
            SensorType::Accelerometer => "timestamp,x,y,z",
            SensorType::Altimeter => "timestamp,relative_altitude,pressure",
        }
    }

    /// One CSV row matching [`SensorData::csv_header`]. Missing values are empty.
    pub fn to_csv(&self) -> String {
        let timestamp = rfc3339(&self.timestamp);
        match &self.payload {
            SensorPayload::Pedometer(d) => format!(
                "{},{},{},{},{},{},{},{},{},{}",
                timestamp,
                rfc3339(&d.start_date),
                rfc3339(&d.end_date),
                d.number_of_steps,
                optional(d.distance),
                optional(d.floors_ascended),
                optional(d.floors_descended),
                optional(d.current_pace),
                optional(d.current_cadence),
                optional(d.average_active_pace),
            ),
            SensorPayload::Accelerometer(d) => format!("{},{},{},{}", timestamp, d.x, d.y, d.z),
            SensorPayload::Altimeter(d) => {
                format!("{},{},{}", timestamp, d.relative_altitude, d.pressure)
            }
        }
    }
}

fn rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
