//! Sensor module - lifecycle core, concrete sensors and backends

mod accelerometer;
mod altimeter;
mod backend;
mod base;
mod configuration;
mod data;
mod handler;
mod manager;
mod pedometer;
mod scripted;
mod simulator;
mod traits;

pub use accelerometer::Accelerometer;
pub use altimeter::Altimeter;
pub use backend::{BackendSink, SensorBackend};
pub use base::SensorCore;
pub use configuration::{
    AccelerometerConfiguration, AltimeterConfiguration, Configuration, PedometerConfiguration,
    SensorConfiguration, MAX_ACCELEROMETER_RATE, MAX_PEDOMETER_INTERVAL_MS,
    MIN_ACCELEROMETER_RATE,
};
pub use data::{AccelerometerData, AltimeterData, PedometerData, SensorData, SensorPayload};
pub use handler::{DataHandler, Subscribers};
pub use manager::SensorManager;
pub use pedometer::Pedometer;
pub use scripted::ScriptedBackend;
pub use simulator::{MotionSimulator, PressureSimulator, StepSimulator};
pub use traits::{Sensor, SensorType};
