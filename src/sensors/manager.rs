// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor manager - one registry for every sensor kind

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{Configuration, DataHandler, Sensor, SensorType};
use crate::core::EventBus;
use crate::error::SensorError;

struct Registration {
    sensor: Arc<dyn Sensor>,
    // Republishes readings on the event bus
    forwarder: DataHandler,
}

/// Holds at most one sensor per type and mirrors their readings onto an
/// [`EventBus`]
pub struct SensorManager {
    sensors: RwLock<HashMap<SensorType, Registration>>,
    event_bus: Arc<EventBus>,
}

impl SensorManager {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            sensors: RwLock::new(HashMap::new()),
            event_bus,
        }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Register a sensor. Fails if the host does not provide it or its type is
    /// already taken.
    pub async fn register(&self, sensor: Arc<dyn Sensor>) -> Result<(), SensorError> {
        let sensor_type = sensor.sensor_type();
        if !sensor.is_available() {
            warn!("{} sensor is not available, not registering", sensor_type);
            return Err(SensorError::Unavailable(sensor_type));
        }

        let mut sensors = self.sensors.write().await;
        if sensors.contains_key(&sensor_type) {
            return Err(SensorError::AlreadyRegistered(sensor_type));
        }

        let forwarder = self.event_bus.handler();
        sensor.subscribe_handler(&forwarder);
        sensors.insert(sensor_type, Registration { sensor, forwarder });

        info!("Registered sensor: {}", sensor_type);
        Ok(())
    }

    /// Remove a sensor, stopping it first and dropping all its handlers
    pub async fn deregister(&self, sensor_type: SensorType) -> Result<(), SensorError> {
        let registration = self
            .sensors
            .write()
            .await
            .remove(&sensor_type)
            .ok_or(SensorError::NotRegistered(sensor_type))?;

        let stopped = registration.sensor.stop_sensing().await;
        registration.sensor.unsubscribe_all_handlers();
        self.event_bus.publish_lifecycle(sensor_type, false);

        info!("Deregistered sensor: {}", sensor_type);
        stopped
    }

    pub async fn get(&self, sensor_type: SensorType) -> Option<Arc<dyn Sensor>> {
        let sensors = self.sensors.read().await;
        sensors.get(&sensor_type).map(|r| Arc::clone(&r.sensor))
    }

    async fn sensor(&self, sensor_type: SensorType) -> Result<Arc<dyn Sensor>, SensorError> {
        self.get(sensor_type)
            .await
            .ok_or(SensorError::NotRegistered(sensor_type))
    }

    pub async fn is_registered(&self, sensor_type: SensorType) -> bool {
        self.sensors.read().await.contains_key(&sensor_type)
    }

    /// Registered sensor types, in declaration order
    pub async fn registered(&self) -> Vec<SensorType> {
        let mut types: Vec<SensorType> = self.sensors.read().await.keys().copied().collect();
        types.sort();
        types
    }

    pub async fn active_count(&self) -> usize {
        let sensors = self.sensors.read().await;
        sensors.values().filter(|r| r.sensor.is_sensing()).count()
    }

    pub async fn is_sensing(&self, sensor_type: SensorType) -> Result<bool, SensorError> {
        Ok(self.sensor(sensor_type).await?.is_sensing())
    }

    pub async fn configuration(&self, sensor_type: SensorType) -> Result<Configuration, SensorError> {
        Ok(self.sensor(sensor_type).await?.configuration())
    }

    /// Route a configuration to the sensor of its type
    pub async fn set_configuration(&self, configuration: Configuration) -> Result<(), SensorError> {
        self.sensor(configuration.sensor_type())
            .await?
            .set_configuration(configuration)
    }

    pub async fn subscribe_handler(
        &self,
        sensor_type: SensorType,
        handler: &DataHandler,
    ) -> Result<(), SensorError> {
        self.sensor(sensor_type).await?.subscribe_handler(handler);
        Ok(())
    }

    pub async fn unsubscribe_handler(
        &self,
        sensor_type: SensorType,
        handler: &DataHandler,
    ) -> Result<(), SensorError> {
        self.sensor(sensor_type).await?.unsubscribe_handler(handler);
        Ok(())
    }

    /// Drop every caller handler; readings keep flowing to the event bus
    pub async fn unsubscribe_all_handlers(&self, sensor_type: SensorType) -> Result<(), SensorError> {
        let sensors = self.sensors.read().await;
        let registration = sensors
            .get(&sensor_type)
            .ok_or(SensorError::NotRegistered(sensor_type))?;
        registration.sensor.unsubscribe_all_handlers();
        registration.sensor.subscribe_handler(&registration.forwarder);
        Ok(())
    }

    pub async fn start_sensing(&self, sensor_type: SensorType) -> Result<(), SensorError> {
        let sensor = self.sensor(sensor_type).await?;
        match sensor.start_sensing().await {
            Ok(()) => {
                self.event_bus.publish_lifecycle(sensor_type, true);
                Ok(())
            }
            Err(e) => {
                self.event_bus.publish_error(sensor_type, &e.to_string());
                Err(e)
            }
        }
    }

    pub async fn stop_sensing(&self, sensor_type: SensorType) -> Result<(), SensorError> {
        let sensor = self.sensor(sensor_type).await?;
        let was_sensing = sensor.is_sensing();
        let result = sensor.stop_sensing().await;
        if was_sensing {
            self.event_bus.publish_lifecycle(sensor_type, false);
        }
        if let Err(e) = &result {
            self.event_bus.publish_error(sensor_type, &e.to_string());
        }
        result
    }

    /// Start every idle sensor, returning how many started.
    /// Failures are logged and published as error events.
    pub async fn start_all(&self) -> usize {
        info!("Starting all sensors...");
        let mut started = 0;
        for sensor_type in self.registered().await {
            match self.start_sensing(sensor_type).await {
                Ok(()) => started += 1,
                Err(SensorError::AlreadySensing(_)) => debug!("{} already sensing", sensor_type),
                Err(e) => warn!("Failed to start {}: {}", sensor_type, e),
            }
        }
        started
    }

    /// Stop every sensing sensor, returning how many were stopped
    pub async fn stop_all(&self) -> usize {
        info!("Stopping all sensors...");
        let mut stopped = 0;
        for sensor_type in self.registered().await {
            let Some(sensor) = self.get(sensor_type).await else {
                continue;
            };
            if !sensor.is_sensing() {
                continue;
            }
            match self.stop_sensing(sensor_type).await {
                Ok(()) => stopped += 1,
                Err(e) => warn!("Error stopping {}: {}", sensor_type, e),
            }
        }
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventPayload;
    use crate::error::BackendError;
    use crate::sensors::{
        Accelerometer, AccelerometerConfiguration, AccelerometerData, Pedometer,
        PedometerConfiguration, PedometerData, ScriptedBackend, SensorConfiguration,
    };
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type StepBackend = ScriptedBackend<PedometerConfiguration, PedometerData>;
    type MotionBackend = ScriptedBackend<AccelerometerConfiguration, AccelerometerData>;

    fn manager() -> SensorManager {
        SensorManager::new(Arc::new(EventBus::new(64)))
    }

    fn pedometer(backend: &StepBackend) -> Arc<dyn Sensor> {
        Arc::new(Pedometer::new(PedometerConfiguration::default(), backend.clone()).unwrap())
    }

    fn accelerometer(backend: &MotionBackend) -> Arc<dyn Sensor> {
        Arc::new(Accelerometer::new(AccelerometerConfiguration::default(), backend.clone()).unwrap())
    }

    fn steps(n: u64) -> PedometerData {
        PedometerData::steps(Utc::now(), Utc::now(), n)
    }

    #[tokio::test]
    async fn test_register_rules() {
        let manager = manager();
        let backend = StepBackend::new();

        manager.register(pedometer(&backend)).await.unwrap();
        assert!(manager.is_registered(SensorType::Pedometer).await);

        let err = manager.register(pedometer(&backend)).await.unwrap_err();
        assert!(matches!(err, SensorError::AlreadyRegistered(SensorType::Pedometer)));

        let err = manager
            .register(accelerometer(&MotionBackend::unavailable()))
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::Unavailable(SensorType::Accelerometer)));
        assert_eq!(manager.registered().await, vec![SensorType::Pedometer]);

        let err = manager.start_sensing(SensorType::Altimeter).await.unwrap_err();
        assert!(matches!(err, SensorError::NotRegistered(SensorType::Altimeter)));
    }

    #[tokio::test]
    async fn test_readings_reach_bus_and_handlers() {
        let manager = manager();
        let backend = StepBackend::new();
        manager.register(pedometer(&backend)).await.unwrap();
        let mut readings = manager.event_bus().subscribe_readings();

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handler = DataHandler::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        manager.subscribe_handler(SensorType::Pedometer, &handler).await.unwrap();

        manager.start_sensing(SensorType::Pedometer).await.unwrap();
        assert!(manager.is_sensing(SensorType::Pedometer).await.unwrap());
        backend.emit(steps(5));

        let reading = readings.recv().await.unwrap();
        assert_eq!(reading.as_pedometer().unwrap().number_of_steps, 5);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Bus forwarding survives unsubscribe-all
        manager.unsubscribe_all_handlers(SensorType::Pedometer).await.unwrap();
        backend.emit(steps(6));
        assert_eq!(readings.recv().await.unwrap().as_pedometer().unwrap().number_of_steps, 6);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_all_and_stop_all() {
        let manager = manager();
        let steps_backend = StepBackend::new();
        let motion_backend = MotionBackend::new();
        motion_backend.fail_next_start(BackendError::ServiceUnavailable("asleep".into()));
        manager.register(pedometer(&steps_backend)).await.unwrap();
        manager.register(accelerometer(&motion_backend)).await.unwrap();
        let mut events = manager.event_bus().subscribe_events();

        assert_eq!(manager.start_all().await, 1);
        assert_eq!(manager.active_count().await, 1);
        assert!(!manager.is_sensing(SensorType::Accelerometer).await.unwrap());

        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if let EventPayload::Error { sensor_type, .. } = event.payload {
                assert_eq!(sensor_type, SensorType::Accelerometer);
                saw_error = true;
            }
        }
        assert!(saw_error);

        assert_eq!(manager.start_all().await, 1);
        assert_eq!(manager.active_count().await, 2);

        assert_eq!(manager.stop_all().await, 2);
        assert_eq!(manager.active_count().await, 0);
        assert!(!steps_backend.is_running());
        assert!(!motion_backend.is_running());
    }

    #[tokio::test]
    async fn test_configuration_routing() {
        let manager = manager();
        let backend = StepBackend::new();
        manager.register(pedometer(&backend)).await.unwrap();

        let updated = PedometerConfiguration { update_interval_ms: 200 }.into_configuration();
        manager.set_configuration(updated.clone()).await.unwrap();
        assert_eq!(manager.configuration(SensorType::Pedometer).await.unwrap(), updated);

        manager.start_sensing(SensorType::Pedometer).await.unwrap();
        let err = manager.set_configuration(updated).await.unwrap_err();
        assert!(matches!(err, SensorError::InvalidState { .. }));

        let err = manager
            .set_configuration(AccelerometerConfiguration::default().into_configuration())
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::NotRegistered(SensorType::Accelerometer)));
    }

    #[tokio::test]
    async fn test_deregister_stops_and_releases() {
        let manager = manager();
        let backend = StepBackend::new();
        let sensor = pedometer(&backend);
        manager.register(sensor.clone()).await.unwrap();
        manager.start_sensing(SensorType::Pedometer).await.unwrap();

        manager.deregister(SensorType::Pedometer).await.unwrap();
        assert!(!sensor.is_sensing());
        assert_eq!(sensor.subscriber_count(), 0);
        assert!(!backend.is_running());
        assert!(manager.get(SensorType::Pedometer).await.is_none());

        let err = manager.deregister(SensorType::Pedometer).await.unwrap_err();
        assert!(matches!(err, SensorError::NotRegistered(_)));
    }
}
