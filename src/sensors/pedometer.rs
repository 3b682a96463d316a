// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Step-counting pedometer

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{
    Configuration, DataHandler, PedometerConfiguration, PedometerData, Sensor, SensorBackend,
    SensorConfiguration, SensorCore, SensorPayload, SensorType,
};
use crate::error::SensorError;

/// Pedometer driven by a platform step-counting service `B`.
///
/// There is no default constructor: a configuration is always required.
pub struct Pedometer<B> {
    core: Arc<SensorCore<PedometerConfiguration>>,
    backend: B,
}

impl<B> Pedometer<B>
where
    B: SensorBackend<Configuration = PedometerConfiguration, Event = PedometerData>,
{
    /// Whether the host can count steps. Construction does not check this.
    pub fn is_sensor_available(backend: &B) -> bool {
        backend.is_available()
    }

    pub fn new(configuration: PedometerConfiguration, backend: B) -> Result<Self, SensorError> {
        let core = SensorCore::new(configuration)?;
        debug!("Created pedometer ({:?})", core.configuration());
        Ok(Self {
            core: Arc::new(core),
            backend,
        })
    }

    /// Build from an untyped configuration, which must be a pedometer one
    pub fn from_configuration(configuration: Configuration, backend: B) -> Result<Self, SensorError> {
        Self::new(PedometerConfiguration::try_from_configuration(configuration)?, backend)
    }

    pub fn config(&self) -> PedometerConfiguration {
        self.core.configuration()
    }

    pub fn set_config(&self, configuration: PedometerConfiguration) -> Result<(), SensorError> {
        self.core.set_configuration(configuration)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B> Sensor for Pedometer<B>
where
    B: SensorBackend<Configuration = PedometerConfiguration, Event = PedometerData>,
{
    fn sensor_type(&self) -> SensorType { self.core.sensor_type() }
    fn is_available(&self) -> bool { self.backend.is_available() }
    fn is_sensing(&self) -> bool { self.core.is_sensing() }

    fn configuration(&self) -> Configuration {
        self.core.configuration().into_configuration()
    }

    fn set_configuration(&self, configuration: Configuration) -> Result<(), SensorError> {
        self.core
            .set_configuration(PedometerConfiguration::try_from_configuration(configuration)?)
    }

    fn subscribe_handler(&self, handler: &DataHandler) { self.core.subscribe_handler(handler); }
    fn unsubscribe_handler(&self, handler: &DataHandler) { self.core.unsubscribe_handler(handler); }
    fn unsubscribe_all_handlers(&self) { self.core.unsubscribe_all_handlers() }
    fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

    async fn start_sensing(&self) -> Result<(), SensorError> {
        self.core.start_backend(&self.backend, SensorPayload::Pedometer).await
    }

    async fn stop_sensing(&self) -> Result<(), SensorError> {
        self.core.stop_backend(&self.backend).await
    }
}
