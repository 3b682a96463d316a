// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Barometric altimeter

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    AltimeterConfiguration, AltimeterData, Configuration, DataHandler, Sensor, SensorBackend,
    SensorConfiguration, SensorCore, SensorPayload, SensorType,
};
use crate::error::SensorError;

pub struct Altimeter<B> {
    core: Arc<SensorCore<AltimeterConfiguration>>,
    backend: B,
}

impl<B> Altimeter<B>
where
    B: SensorBackend<Configuration = AltimeterConfiguration, Event = AltimeterData>,
{
    pub fn is_sensor_available(backend: &B) -> bool {
        backend.is_available()
    }

    pub fn new(configuration: AltimeterConfiguration, backend: B) -> Result<Self, SensorError> {
        Ok(Self {
            core: Arc::new(SensorCore::new(configuration)?),
            backend,
        })
    }

    pub fn from_configuration(configuration: Configuration, backend: B) -> Result<Self, SensorError> {
        Self::new(AltimeterConfiguration::try_from_configuration(configuration)?, backend)
    }

    pub fn config(&self) -> AltimeterConfiguration {
        self.core.configuration()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B> Sensor for Altimeter<B>
where
    B: SensorBackend<Configuration = AltimeterConfiguration, Event = AltimeterData>,
{
    fn sensor_type(&self) -> SensorType { self.core.sensor_type() }
    fn is_available(&self) -> bool { self.backend.is_available() }
    fn is_sensing(&self) -> bool { self.core.is_sensing() }

    fn configuration(&self) -> Configuration {
        self.core.configuration().into_configuration()
    }

    fn set_configuration(&self, configuration: Configuration) -> Result<(), SensorError> {
        self.core
            .set_configuration(AltimeterConfiguration::try_from_configuration(configuration)?)
    }

    fn subscribe_handler(&self, handler: &DataHandler) { self.core.subscribe_handler(handler); }
    fn unsubscribe_handler(&self, handler: &DataHandler) { self.core.unsubscribe_handler(handler); }
    fn unsubscribe_all_handlers(&self) { self.core.unsubscribe_all_handlers() }
    fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

    async fn start_sensing(&self) -> Result<(), SensorError> {
        self.core.start_backend(&self.backend, SensorPayload::Altimeter).await
    }

    async fn stop_sensing(&self) -> Result<(), SensorError> {
        self.core.stop_backend(&self.backend).await
    }
}
