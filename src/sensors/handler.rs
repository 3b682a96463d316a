// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Data handlers and the subscriber fan-out shared by all sensors

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::{SensorData, SensorType};

type HandlerFn = dyn Fn(SensorType, &SensorData) + Send + Sync + 'static;

/// Callback invoked once per reading.
///
/// Clones share identity: a clone unsubscribes the original.
#[derive(Clone)]
pub struct DataHandler {
    callback: Arc<HandlerFn>,
}

impl DataHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(SensorType, &SensorData) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn call(&self, sensor_type: SensorType, data: &SensorData) {
        (self.callback)(sensor_type, data)
    }

    /// Identity comparison
    pub fn same_as(&self, other: &DataHandler) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl PartialEq for DataHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for DataHandler {}

impl fmt::Debug for DataHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandler")
            .field("callback", &Arc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Set of subscribed handlers, unique by identity.
///
/// Dispatch copies the set under the lock and calls handlers outside it, so a
/// handler may subscribe or unsubscribe while being called.
#[derive(Default)]
pub struct Subscribers {
    handlers: Mutex<Vec<DataHandler>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the handler was already subscribed
    pub fn subscribe(&self, handler: &DataHandler) -> bool {
        let mut handlers = self.handlers.lock();
        if handlers.iter().any(|h| h.same_as(handler)) {
            return false;
        }
        handlers.push(handler.clone());
        true
    }

    /// Returns false if the handler was not subscribed
    pub fn unsubscribe(&self, handler: &DataHandler) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|h| !h.same_as(handler));
        handlers.len() != before
    }

    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    pub fn contains(&self, handler: &DataHandler) -> bool {
        self.handlers.lock().iter().any(|h| h.same_as(handler))
    }

    pub fn snapshot(&self) -> Vec<DataHandler> {
        self.handlers.lock().clone()
    }

    /// Call every handler with `data`, returning how many were called.
    ///
    /// A panicking handler is logged and skipped.
    pub fn dispatch(&self, sensor_type: SensorType, data: &SensorData) -> usize {
        let handlers = self.snapshot();
        for handler in &handlers {
            if catch_unwind(AssertUnwindSafe(|| handler.call(sensor_type, data))).is_err() {
                warn!("Handler panicked while receiving {} data", sensor_type);
            }
        }
        handlers.len()
    }
}
