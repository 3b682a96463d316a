// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Manually driven backend for tests and hosts without real hardware

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use super::{BackendSink, SensorBackend, SensorConfiguration};
use crate::error::BackendError;

struct Inner<C, E> {
    available: AtomicBool,
    running: Mutex<Option<BackendSink<E>>>,
    // Outlives stop, to replay late deliveries
    retained: Mutex<Option<BackendSink<E>>>,
    fail_next_start: Mutex<Option<BackendError>>,
    fail_next_stop: Mutex<Option<BackendError>>,
    hold_next_start: AtomicBool,
    start_entered: Notify,
    start_released: Notify,
    starts: AtomicUsize,
    stops: AtomicUsize,
    last_configuration: Mutex<Option<C>>,
}

/// Backend whose events are pushed by hand with [`ScriptedBackend::emit`].
///
/// Clones share state, so a test can keep a handle after moving one into a
/// sensor.
pub struct ScriptedBackend<C, E> {
    inner: Arc<Inner<C, E>>,
}

impl<C, E> ScriptedBackend<C, E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                available: AtomicBool::new(true),
                running: Mutex::new(None),
                retained: Mutex::new(None),
                fail_next_start: Mutex::new(None),
                fail_next_stop: Mutex::new(None),
                hold_next_start: AtomicBool::new(false),
                start_entered: Notify::new(),
                start_released: Notify::new(),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                last_configuration: Mutex::new(None),
            }),
        }
    }

    /// A backend that reports the sensor as absent
    pub fn unavailable() -> Self {
        let backend = Self::new();
        backend.set_available(false);
        backend
    }

    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Make the next `start` fail with `error`
    pub fn fail_next_start(&self, error: BackendError) {
        *self.inner.fail_next_start.lock() = Some(error);
    }

    /// Make the next `stop` fail with `error`
    pub fn fail_next_stop(&self, error: BackendError) {
        *self.inner.fail_next_stop.lock() = Some(error);
    }

    /// Park the next `start` until [`ScriptedBackend::release_start`]
    pub fn hold_next_start(&self) {
        self.inner.hold_next_start.store(true, Ordering::SeqCst);
    }

    pub fn release_start(&self) {
        self.inner.start_released.notify_one();
    }

    /// Wait until a held `start` has been entered
    pub async fn wait_for_start(&self) {
        self.inner.start_entered.notified().await;
    }

    /// Push an event into the running stream. Returns false if nothing was
    /// running or the sensor dropped it.
    pub fn emit(&self, event: E) -> bool {
        let sink = self.inner.running.lock().clone();
        match sink {
            Some(sink) => sink.deliver(event),
            None => false,
        }
    }

    /// Push an event through the most recent stream, even if it was stopped
    pub fn emit_late(&self, event: E) -> bool {
        let sink = self.inner.retained.lock().clone();
        match sink {
            Some(sink) => sink.deliver(event),
            None => false,
        }
    }

    pub fn current_sink(&self) -> Option<BackendSink<E>> {
        self.inner.running.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.lock().is_some()
    }

    pub fn start_count(&self) -> usize {
        self.inner.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.inner.stops.load(Ordering::SeqCst)
    }
}

impl<C: Clone, E> ScriptedBackend<C, E> {
    /// Configuration passed to the most recent `start`
    pub fn last_configuration(&self) -> Option<C> {
        self.inner.last_configuration.lock().clone()
    }
}

impl<C, E> Clone for ScriptedBackend<C, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, E> Default for ScriptedBackend<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C, E> SensorBackend for ScriptedBackend<C, E>
where
    C: SensorConfiguration,
    E: Send + 'static,
{
    type Configuration = C;
    type Event = E;

    fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    async fn start(&self, configuration: &C, sink: BackendSink<E>) -> Result<(), BackendError> {
        self.inner.starts.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_configuration.lock() = Some(configuration.clone());

        if self.inner.hold_next_start.swap(false, Ordering::SeqCst) {
            debug!("Scripted {} start held", C::SENSOR_TYPE);
            self.inner.start_entered.notify_one();
            self.inner.start_released.notified().await;
        }

        let failure = self.inner.fail_next_start.lock().take();
        if let Some(error) = failure {
            return Err(error);
        }

        *self.inner.retained.lock() = Some(sink.clone());
        *self.inner.running.lock() = Some(sink);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        self.inner.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.running.lock().take();

        let failure = self.inner.fail_next_stop.lock().take();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
