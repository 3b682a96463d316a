// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! sensekit - uniform sensing layer over heterogeneous sensor backends
//!
//! Every sensor kind exposes the same lifecycle: subscribe data handlers,
//! start sensing, receive typed readings, stop sensing. Platform specifics
//! live behind a [`sensors::SensorBackend`]; the shared state machine in
//! [`sensors::SensorCore`] guarantees that readings only reach handlers
//! between a successful start and the matching stop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    SensorManager                     │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────┐   │
//! │  │ Pedometer │  │ Accelerometer │  │  Altimeter  │   │
//! │  └───────────┘  └───────────────┘  └─────────────┘   │
//! │        ↓              ↓                  ↓           │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │        SensorCore (state, handlers, gate)      │  │
//! │  └────────────────────────────────────────────────┘  │
//! │        ↑              ↑                  ↑           │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │   SensorBackend (platform / simulator / test)  │  │
//! │  └────────────────────────────────────────────────┘  │
//! │        ↓                                             │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │                   Event Bus                    │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod sensors;

// Re-exports for convenience
pub use config::{Config, OutputFormat};
pub use core::{Event, EventBus, EventPayload};
pub use error::{BackendError, SensorError};
pub use sensors::{
    Accelerometer, Altimeter, Configuration, DataHandler, Pedometer, Sensor, SensorData,
    SensorManager, SensorType,
};

/// sensekit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// sensekit name
pub const NAME: &str = "sensekit";
