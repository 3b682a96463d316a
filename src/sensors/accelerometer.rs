// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Three-axis accelerometer

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    AccelerometerConfiguration, AccelerometerData, Configuration, DataHandler, Sensor,
    SensorBackend, SensorConfiguration, SensorCore, SensorPayload, SensorType,
};
use crate::error::SensorError;

pub struct Accelerometer<B> {
    core: Arc<SensorCore<AccelerometerConfiguration>>,
    backend: B,
}

impl<B> Accelerometer<B>
where
    B: SensorBackend<Configuration = AccelerometerConfiguration, Event = AccelerometerData>,
{
    pub fn is_sensor_available(backend: &B) -> bool {
        backend.is_available()
    }

    pub fn new(configuration: AccelerometerConfiguration, backend: B) -> Result<Self, SensorError> {
        Ok(Self {
            core: Arc::new(SensorCore::new(configuration)?),
            backend,
        })
    }

    pub fn from_configuration(configuration: Configuration, backend: B) -> Result<Self, SensorError> {
        Self::new(AccelerometerConfiguration::try_from_configuration(configuration)?, backend)
    }

    pub fn config(&self) -> AccelerometerConfiguration {
        self.core.configuration()
    }

    pub fn set_config(&self, configuration: AccelerometerConfiguration) -> Result<(), SensorError> {
        self.core.set_configuration(configuration)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B> Sensor for Accelerometer<B>
where
    B: SensorBackend<Configuration = AccelerometerConfiguration, Event = AccelerometerData>,
{
    fn sensor_type(&self) -> SensorType { self.core.sensor_type() }
    fn is_available(&self) -> bool { self.backend.is_available() }
    fn is_sensing(&self) -> bool { self.core.is_sensing() }

    fn configuration(&self) -> Configuration {
        self.core.configuration().into_configuration()
    }

    fn set_configuration(&self, configuration: Configuration) -> Result<(), SensorError> {
        self.core
            .set_configuration(AccelerometerConfiguration::try_from_configuration(configuration)?)
    }

    fn subscribe_handler(&self, handler: &DataHandler) { self.core.subscribe_handler(handler); }
    fn unsubscribe_handler(&self, handler: &DataHandler) { self.core.unsubscribe_handler(handler); }
    fn unsubscribe_all_handlers(&self) { self.core.unsubscribe_all_handlers() }
    fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

    async fn start_sensing(&self) -> Result<(), SensorError> {
        self.core.start_backend(&self.backend, SensorPayload::Accelerometer).await
    }

    async fn stop_sensing(&self) -> Result<(), SensorError> {
        self.core.stop_backend(&self.backend).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{Pedometer, PedometerConfiguration, PedometerData, ScriptedBackend};
    use chrono::Utc;
    use parking_lot::Mutex;

    #[test]
    fn test_rejects_out_of_range_rate() {
        let backend = ScriptedBackend::<AccelerometerConfiguration, AccelerometerData>::new();
        let result = Accelerometer::new(AccelerometerConfiguration::with_sample_rate(-1.0), backend);
        assert!(matches!(result, Err(SensorError::InvalidConfiguration { .. })));
    }

    #[tokio::test]
    async fn test_tags_follow_the_originating_sensor() {
        let accel_backend = ScriptedBackend::<AccelerometerConfiguration, AccelerometerData>::new();
        let step_backend = ScriptedBackend::<PedometerConfiguration, PedometerData>::new();
        let accelerometer =
            Accelerometer::new(AccelerometerConfiguration::default(), accel_backend.clone()).unwrap();
        let pedometer = Pedometer::new(PedometerConfiguration::default(), step_backend.clone()).unwrap();

        // One handler shared by both sensors
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let handler = DataHandler::new(move |sensor_type, data| {
            s.lock().push((sensor_type, data.sensor_type()));
        });
        accelerometer.subscribe_handler(&handler);
        pedometer.subscribe_handler(&handler);

        accelerometer.start_sensing().await.unwrap();
        pedometer.start_sensing().await.unwrap();

        accel_backend.emit(AccelerometerData { x: 0.1, y: 0.0, z: 0.98 });
        step_backend.emit(PedometerData::steps(Utc::now(), Utc::now(), 4));
        accel_backend.emit(AccelerometerData { x: 0.0, y: 0.2, z: 1.01 });

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![
                (SensorType::Accelerometer, SensorType::Accelerometer),
                (SensorType::Pedometer, SensorType::Pedometer),
                (SensorType::Accelerometer, SensorType::Accelerometer),
            ]
        );
    }
}
