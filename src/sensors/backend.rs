// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Contract consumed from platform sensing services

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::SensorConfiguration;
use crate::error::BackendError;

/// A platform service producing raw events for one sensor type.
///
/// Backends are handed in at construction; sensors never reach for a global
/// service.
#[async_trait]
pub trait SensorBackend: Send + Sync + 'static {
    type Configuration: SensorConfiguration;
    type Event: Send + 'static;

    /// Whether the host exposes this sensor at all
    fn is_available(&self) -> bool;

    /// Begin producing events into `sink`. Errors here fail the sensor's start.
    async fn start(
        &self,
        configuration: &Self::Configuration,
        sink: BackendSink<Self::Event>,
    ) -> Result<(), BackendError>;

    /// End the event stream begun by `start`
    async fn stop(&self) -> Result<(), BackendError>;
}

/// Callback a backend pushes raw events into.
///
/// A sink belongs to one sensing session. After that session is stopped,
/// delivery through it is silently dropped.
pub struct BackendSink<E> {
    deliver: Arc<dyn Fn(E) -> bool + Send + Sync>,
}

impl<E> BackendSink<E> {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(E) -> bool + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Forward one event. Returns false if it was dropped.
    pub fn deliver(&self, event: E) -> bool {
        (self.deliver)(event)
    }
}

impl<E> Clone for BackendSink<E> {
    fn clone(&self) -> Self {
        Self {
            deliver: Arc::clone(&self.deliver),
        }
    }
}

impl<E> fmt::Debug for BackendSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSink").finish_non_exhaustive()
    }
}
