// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated backends for demos and hosts without sensing hardware

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::Normal;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use super::{
    AccelerometerConfiguration, AccelerometerData, AltimeterConfiguration, AltimeterData,
    BackendSink, PedometerConfiguration, PedometerData, SensorBackend,
};
use crate::error::BackendError;

/// Sea-level standard pressure, kPa
const STANDARD_PRESSURE: f64 = 101.325;

/// Drives a generator closure on a tokio interval
struct Generator {
    task: Mutex<Option<JoinHandle<()>>>,
    seed: Option<u64>,
    available: bool,
}

impl Generator {
    fn new(seed: Option<u64>, available: bool) -> Self {
        Self {
            task: Mutex::new(None),
            seed,
            available,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn ensure_available(&self, what: &str) -> Result<(), BackendError> {
        if self.available {
            Ok(())
        } else {
            Err(BackendError::ServiceUnavailable(format!("{} is not supported on this host", what)))
        }
    }

    fn spawn<E, F>(&self, period: Duration, sink: BackendSink<E>, mut next: F)
    where
        E: Send + 'static,
        F: FnMut() -> E + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !sink.deliver(next()) {
                    trace!("Simulated reading dropped by sensor");
                }
            }
        });
        if let Some(previous) = self.task.lock().replace(handle) {
            previous.abort();
        }
    }

    fn halt(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>, BackendError> {
    Normal::new(mean, std_dev).map_err(|e| BackendError::Other(format!("bad distribution: {}", e)))
}

/// Walking-pace step counter
pub struct StepSimulator {
    generator: Generator,
}

impl StepSimulator {
    pub fn new() -> Self {
        Self { generator: Generator::new(None, true) }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { generator: Generator::new(Some(seed), true) }
    }

    /// A simulator reporting that steps cannot be counted
    pub fn unavailable() -> Self {
        Self { generator: Generator::new(None, false) }
    }
}

impl Default for StepSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorBackend for StepSimulator {
    type Configuration = PedometerConfiguration;
    type Event = PedometerData;

    fn is_available(&self) -> bool {
        self.generator.available
    }

    async fn start(
        &self,
        configuration: &PedometerConfiguration,
        sink: BackendSink<PedometerData>,
    ) -> Result<(), BackendError> {
        self.generator.ensure_available("step counting")?;

        let period = configuration.update_interval();
        let dt = period.as_secs_f64();
        let cadence = normal(1.8, 0.15)?;  // steps/s
        let stride = normal(0.75, 0.05)?;  // m
        let mut rng = self.generator.rng();

        let start_date = Utc::now();
        let mut steps = 0u64;
        let mut carry = 0.0;
        let mut distance = 0.0;
        let (mut ascended, mut descended) = (0u32, 0u32);

        self.generator.spawn(period, sink, move || {
            let current_cadence = rng.sample::<f64, _>(cadence).max(0.0);
            let stride_length = rng.sample::<f64, _>(stride).max(0.3);

            carry += current_cadence * dt;
            let new_steps = carry.floor();
            carry -= new_steps;
            steps += new_steps as u64;
            distance += new_steps * stride_length;

            // Occasional stairs
            if rng.gen::<f64>() < 0.02 {
                if rng.gen_bool(0.5) {
                    ascended += 1;
                } else {
                    descended += 1;
                }
            }

            let end_date = Utc::now();
            let elapsed = (end_date - start_date).num_milliseconds() as f64 / 1000.0;
            let speed = current_cadence * stride_length;

            PedometerData {
                start_date,
                end_date,
                number_of_steps: steps,
                distance: Some(distance),
                floors_ascended: Some(ascended),
                floors_descended: Some(descended),
                current_pace: (speed > 0.0).then(|| 1.0 / speed),
                current_cadence: Some(current_cadence),
                average_active_pace: (distance > 0.0).then(|| elapsed / distance),
            }
        });

        debug!("Step simulator running every {:?}", period);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        self.generator.halt();
        Ok(())
    }
}

/// Device resting face-up with occasional jolts
pub struct MotionSimulator {
    generator: Generator,
    anomaly_probability: f64,
}

impl MotionSimulator {
    pub fn new() -> Self {
        Self {
            generator: Generator::new(None, true),
            anomaly_probability: 0.02,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            generator: Generator::new(Some(seed), true),
            anomaly_probability: 0.02,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            generator: Generator::new(None, false),
            anomaly_probability: 0.02,
        }
    }
}

impl Default for MotionSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorBackend for MotionSimulator {
    type Configuration = AccelerometerConfiguration;
    type Event = AccelerometerData;

    fn is_available(&self) -> bool {
        self.generator.available
    }

    async fn start(
        &self,
        configuration: &AccelerometerConfiguration,
        sink: BackendSink<AccelerometerData>,
    ) -> Result<(), BackendError> {
        self.generator.ensure_available("accelerometer")?;

        let noise = normal(0.0, 0.01)?;
        let anomaly_probability = self.anomaly_probability;
        let mut rng = self.generator.rng();

        self.generator.spawn(configuration.sample_interval(), sink, move || {
            // Gravity on Z axis
            let mut axes = [
                rng.sample::<f64, _>(noise),
                rng.sample::<f64, _>(noise),
                1.0 + rng.sample::<f64, _>(noise),
            ];

            if rng.gen::<f64>() < anomaly_probability {
                let axis = rng.gen_range(0..3);
                axes[axis] += rng.gen_range(0.1..0.5) * rng.gen_range(-1.0..1.0);
            }

            AccelerometerData { x: axes[0], y: axes[1], z: axes[2] }
        });

        debug!("Motion simulator running at {} Hz", configuration.sample_rate);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        self.generator.halt();
        Ok(())
    }
}

/// Slowly drifting barometric pressure
pub struct PressureSimulator {
    generator: Generator,
    period: Duration,
}

impl PressureSimulator {
    pub fn new() -> Self {
        Self {
            generator: Generator::new(None, true),
            period: Duration::from_secs(1),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            generator: Generator::new(Some(seed), true),
            period: Duration::from_secs(1),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            generator: Generator::new(None, false),
            period: Duration::from_secs(1),
        }
    }

    /// Override the update period (the altimeter has no configuration for it)
    pub fn every(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

impl Default for PressureSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Height difference between two pressures, international barometric formula
fn altitude_between(reference: f64, pressure: f64) -> f64 {
    44_330.0 * (1.0 - (pressure / reference).powf(1.0 / 5.255))
}

#[async_trait]
impl SensorBackend for PressureSimulator {
    type Configuration = AltimeterConfiguration;
    type Event = AltimeterData;

    fn is_available(&self) -> bool {
        self.generator.available
    }

    async fn start(
        &self,
        _configuration: &AltimeterConfiguration,
        sink: BackendSink<AltimeterData>,
    ) -> Result<(), BackendError> {
        self.generator.ensure_available("barometric altimeter")?;

        let jitter = normal(0.0, 0.002)?;
        let mut rng = self.generator.rng();
        let reference = STANDARD_PRESSURE + rng.gen_range(-1.5..1.5);
        let mut pressure = reference;

        self.generator.spawn(self.period, sink, move || {
            pressure += rng.sample::<f64, _>(jitter);
            AltimeterData {
                relative_altitude: altitude_between(reference, pressure),
                pressure,
            }
        });

        debug!("Pressure simulator running every {:?}", self.period);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        self.generator.halt();
        Ok(())
    }
}
