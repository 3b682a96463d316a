// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Cross-sensor plumbing

mod event_bus;

pub use event_bus::{Event, EventBus, EventPayload};
