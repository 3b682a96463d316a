// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Event bus bridging synchronous handlers to async consumers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::sensors::{DataHandler, SensorData, SensorType};

/// Generic event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Reading(SensorData),
    Lifecycle { sensor_type: SensorType, sensing: bool },
    Error { sensor_type: SensorType, message: String },
}

/// Broadcast bus for readings and sensor lifecycle events.
///
/// Slow receivers lag and lose the oldest items; publishing never blocks.
pub struct EventBus {
    reading_tx: broadcast::Sender<SensorData>,
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (reading_tx, _) = broadcast::channel(capacity);
        let (event_tx, _) = broadcast::channel(capacity);

        Self {
            reading_tx,
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    pub fn publish_reading(&self, reading: SensorData) {
        let _ = self.reading_tx.send(reading.clone());
        self.publish_event(EventPayload::Reading(reading));
    }

    pub fn publish_lifecycle(&self, sensor_type: SensorType, sensing: bool) {
        self.publish_event(EventPayload::Lifecycle { sensor_type, sensing });
    }

    pub fn publish_error(&self, sensor_type: SensorType, message: &str) {
        self.publish_event(EventPayload::Error {
            sensor_type,
            message: message.to_string(),
        });
    }

    fn publish_event(&self, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_readings(&self) -> broadcast::Receiver<SensorData> {
        self.reading_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// A handler that republishes every reading it receives on this bus
    pub fn handler(self: &Arc<Self>) -> DataHandler {
        let bus = Arc::clone(self);
        DataHandler::new(move |_, data| bus.publish_reading(data.clone()))
    }
}
