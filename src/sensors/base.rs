// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Lifecycle and subscription core held by every concrete sensor
//!
//! A `SensorCore` owns the configuration, the sensing phase and the subscriber
//! set. Concrete sensors compose one and route their backend through
//! [`SensorCore::start_backend`] / [`SensorCore::stop_backend`].
//!
//! Every start opens a numbered session. Readings are accepted only for the
//! open session, checked under a delivery gate; stop closes the session under
//! that same gate, so once stop returns nothing from the old session reaches a
//! handler, however late the backend delivers it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, info, trace, warn};

use super::{
    BackendSink, DataHandler, SensorBackend, SensorConfiguration, SensorData, SensorPayload,
    SensorType, Subscribers,
};
use crate::error::SensorError;

const CLOSED: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Backend acquisition in flight
    Starting(u64),
    Sensing(u64),
}

struct State<C> {
    phase: Phase,
    configuration: C,
}

/// Shared sensor state: configuration, sensing phase and subscribers
pub struct SensorCore<C: SensorConfiguration> {
    state: Mutex<State<C>>,
    subscribers: Subscribers,
    // Re-entrant so a handler may submit while being called
    delivery: ReentrantMutex<()>,
    open_session: AtomicU64,
    next_session: AtomicU64,
    // Serialises backend start/stop calls
    backend_ops: tokio::sync::Mutex<()>,
}

impl<C: SensorConfiguration> SensorCore<C> {
    /// Create an idle core. Fails if the configuration does not validate.
    pub fn new(configuration: C) -> Result<Self, SensorError> {
        configuration.validate()?;
        Ok(Self {
            state: Mutex::new(State {
                phase: Phase::Idle,
                configuration,
            }),
            subscribers: Subscribers::new(),
            delivery: ReentrantMutex::new(()),
            open_session: AtomicU64::new(CLOSED),
            next_session: AtomicU64::new(CLOSED),
            backend_ops: tokio::sync::Mutex::new(()),
        })
    }

    pub fn sensor_type(&self) -> SensorType {
        C::SENSOR_TYPE
    }

    pub fn is_sensing(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Sensing(_))
    }

    pub fn configuration(&self) -> C {
        self.state.lock().configuration.clone()
    }

    /// Replace the configuration. Rejected with `InvalidState` unless idle.
    pub fn set_configuration(&self, configuration: C) -> Result<(), SensorError> {
        configuration.validate()?;
        let mut state = self.state.lock();
        if state.phase != Phase::Idle {
            return Err(SensorError::InvalidState {
                sensor_type: C::SENSOR_TYPE,
                reason: "configuration cannot change while sensing",
            });
        }
        debug!("{} configuration updated: {:?}", C::SENSOR_TYPE, configuration);
        state.configuration = configuration;
        Ok(())
    }

    pub fn subscribe_handler(&self, handler: &DataHandler) -> bool {
        let added = self.subscribers.subscribe(handler);
        if !added {
            trace!("Handler already subscribed to {}", C::SENSOR_TYPE);
        }
        added
    }

    pub fn unsubscribe_handler(&self, handler: &DataHandler) -> bool {
        self.subscribers.unsubscribe(handler)
    }

    pub fn unsubscribe_all_handlers(&self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `data` to every subscriber, returning how many were called.
    ///
    /// Only valid inside a start/stop bracket; outside it the data is
    /// discarded. Data of another sensor type is discarded as well.
    pub fn submit_sensor_data(&self, data: SensorData) -> usize {
        let _gate = self.delivery.lock();
        if self.open_session.load(Ordering::Acquire) == CLOSED {
            trace!("Discarding {} data submitted while not sensing", C::SENSOR_TYPE);
            return 0;
        }
        self.dispatch(&data)
    }

    fn submit_in_session(&self, session: u64, data: SensorData) -> Option<usize> {
        let _gate = self.delivery.lock();
        if self.open_session.load(Ordering::Acquire) != session {
            trace!("Dropping late {} data from session {}", C::SENSOR_TYPE, session);
            return None;
        }
        Some(self.dispatch(&data))
    }

    fn dispatch(&self, data: &SensorData) -> usize {
        if data.sensor_type() != C::SENSOR_TYPE {
            warn!(
                "Discarding {} data submitted to the {} sensor",
                data.sensor_type(),
                C::SENSOR_TYPE
            );
            return 0;
        }
        self.subscribers.dispatch(C::SENSOR_TYPE, data)
    }

    /// Acquire `backend` and move to Sensing.
    ///
    /// Each raw backend event is turned into a payload by `translate`, stamped,
    /// and fanned out. Fails with `AlreadySensing` if already sensing, and with
    /// `BackendStartFailure` (leaving the sensor idle) if the backend refuses.
    /// A backend that panics, or a caller that drops this future before it
    /// completes, also leaves the sensor idle with its session closed.
    pub async fn start_backend<B, F>(self: &Arc<Self>, backend: &B, translate: F) -> Result<(), SensorError>
    where
        B: SensorBackend<Configuration = C>,
        F: Fn(B::Event) -> SensorPayload + Send + Sync + 'static,
    {
        let _ops = self.backend_ops.lock().await;
        let (session, configuration) = self.begin_start()?;
        let pending = PendingStart {
            core: &**self,
            session,
            armed: true,
        };
        self.open_gate(session);

        debug!("Starting {} backend (session {})", C::SENSOR_TYPE, session);
        let sink = self.session_sink(session, translate);

        match backend.start(&configuration, sink).await {
            Ok(()) => {
                if self.finish_start(session, true) {
                    pending.disarm();
                    info!("{} sensor started", C::SENSOR_TYPE);
                    return Ok(());
                }
                debug!("{} start was cancelled by stop, releasing backend", C::SENSOR_TYPE);
                if let Err(e) = backend.stop().await {
                    warn!("Error releasing cancelled {} backend: {}", C::SENSOR_TYPE, e);
                }
                Err(SensorError::StartCancelled(C::SENSOR_TYPE))
            }
            Err(source) => {
                drop(pending);
                warn!("{} backend failed to start: {}", C::SENSOR_TYPE, source);
                Err(SensorError::BackendStartFailure {
                    sensor_type: C::SENSOR_TYPE,
                    source,
                })
            }
        }
    }

    /// Release `backend` and move to Idle. A no-op when not sensing.
    ///
    /// A stop issued while a start is still acquiring the backend returns at
    /// once; the start path releases the backend when acquisition completes.
    pub async fn stop_backend<B>(&self, backend: &B) -> Result<(), SensorError>
    where
        B: SensorBackend<Configuration = C>,
    {
        if let Some(session) = self.cancel_pending_start() {
            self.close_gate(session);
            debug!("{} stop cancelled a start in flight", C::SENSOR_TYPE);
            return Ok(());
        }

        let _ops = self.backend_ops.lock().await;
        let session = {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Sensing(session) => {
                    state.phase = Phase::Idle;
                    session
                }
                _ => {
                    debug!("{} sensor is not sensing, nothing to stop", C::SENSOR_TYPE);
                    return Ok(());
                }
            }
        };
        self.close_gate(session);
        info!("{} sensor stopped", C::SENSOR_TYPE);

        backend.stop().await.map_err(|source| {
            warn!("{} backend failed to stop: {}", C::SENSOR_TYPE, source);
            SensorError::BackendStopFailure {
                sensor_type: C::SENSOR_TYPE,
                source,
            }
        })
    }

    fn begin_start(&self) -> Result<(u64, C), SensorError> {
        let mut state = self.state.lock();
        if state.phase != Phase::Idle {
            return Err(SensorError::AlreadySensing(C::SENSOR_TYPE));
        }
        let session = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        state.phase = Phase::Starting(session);
        Ok((session, state.configuration.clone()))
    }

    /// Returns false if the start was cancelled in the meantime
    fn finish_start(&self, session: u64, succeeded: bool) -> bool {
        let mut state = self.state.lock();
        if state.phase != Phase::Starting(session) {
            return false;
        }
        state.phase = if succeeded {
            Phase::Sensing(session)
        } else {
            Phase::Idle
        };
        true
    }

    fn cancel_pending_start(&self) -> Option<u64> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Starting(session) => {
                state.phase = Phase::Idle;
                Some(session)
            }
            _ => None,
        }
    }

    fn open_gate(&self, session: u64) {
        let _gate = self.delivery.lock();
        if self.state.lock().phase == Phase::Starting(session) {
            self.open_session.store(session, Ordering::Release);
        }
    }

    fn close_gate(&self, session: u64) {
        let _gate = self.delivery.lock();
        let _ = self.open_session.compare_exchange(
            session,
            CLOSED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn session_sink<E, F>(self: &Arc<Self>, session: u64, translate: F) -> BackendSink<E>
    where
        E: Send + 'static,
        F: Fn(E) -> SensorPayload + Send + Sync + 'static,
    {
        let core = Arc::downgrade(self);
        BackendSink::new(move |event| match core.upgrade() {
            Some(core) => core
                .submit_in_session(session, SensorData::new(translate(event)))
                .is_some(),
            None => false,
        })
    }
}

/// Reverts an unfinished start to Idle and closes its session when dropped
struct PendingStart<'a, C: SensorConfiguration> {
    core: &'a SensorCore<C>,
    session: u64,
    armed: bool,
}

impl<C: SensorConfiguration> PendingStart<'_, C> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C: SensorConfiguration> Drop for PendingStart<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.core.finish_start(self.session, false) {
            debug!("{} start abandoned (session {})", C::SENSOR_TYPE, self.session);
        }
        self.core.close_gate(self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::sensors::{
        AccelerometerData, PedometerConfiguration, PedometerData, ScriptedBackend,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    type Backend = ScriptedBackend<PedometerConfiguration, PedometerData>;

    fn core() -> Arc<SensorCore<PedometerConfiguration>> {
        Arc::new(SensorCore::new(PedometerConfiguration::default()).unwrap())
    }

    fn steps(n: u64) -> PedometerData {
        PedometerData::steps(Utc::now(), Utc::now(), n)
    }

    fn counting(core: &SensorCore<PedometerConfiguration>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        core.subscribe_handler(&DataHandler::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[test]
    fn test_invalid_configuration_rejected_at_construction() {
        let result = SensorCore::new(PedometerConfiguration { update_interval_ms: 0 });
        assert!(matches!(result, Err(SensorError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_submit_while_idle_is_discarded() {
        let core = core();
        let count = counting(&core);
        assert_eq!(core.submit_sensor_data(SensorData::new(steps(1))), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_while_sensing_and_type_check() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        assert_eq!(core.submit_sensor_data(SensorData::new(steps(1))), 1);
        let foreign = SensorData::new(AccelerometerData { x: 0.0, y: 0.0, z: 1.0 });
        assert_eq!(core.submit_sensor_data(foreign), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_twice_fails_and_stays_sensing() {
        let core = core();
        let backend = Backend::new();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        let err = core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap_err();
        assert!(matches!(err, SensorError::AlreadySensing(SensorType::Pedometer)));
        assert!(core.is_sensing());
        assert_eq!(backend.start_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_twice_is_noop() {
        let core = core();
        let backend = Backend::new();
        core.stop_backend(&backend).await.unwrap();
        assert!(!core.is_sensing());
        assert_eq!(backend.stop_count(), 0);

        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        core.stop_backend(&backend).await.unwrap();
        core.stop_backend(&backend).await.unwrap();
        assert!(!core.is_sensing());
        assert_eq!(backend.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_idle() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);
        backend.fail_next_start(BackendError::PermissionDenied("motion access".into()));

        let err = core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap_err();
        match err {
            SensorError::BackendStartFailure { sensor_type, source } => {
                assert_eq!(sensor_type, SensorType::Pedometer);
                assert_eq!(source, BackendError::PermissionDenied("motion access".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!core.is_sensing());
        assert_eq!(core.submit_sensor_data(SensorData::new(steps(1))), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // The failure was one-shot
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        assert!(core.is_sensing());
    }

    #[tokio::test]
    async fn test_backend_stop_failure_still_idles() {
        let core = core();
        let backend = Backend::new();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        backend.fail_next_stop(BackendError::Other("busy".into()));

        let err = core.stop_backend(&backend).await.unwrap_err();
        assert!(matches!(err, SensorError::BackendStopFailure { .. }));
        assert!(!core.is_sensing());
        assert!(!backend.emit(steps(1)));
    }

    #[tokio::test]
    async fn test_configuration_locked_while_sensing() {
        let core = core();
        let backend = Backend::new();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        let err = core
            .set_configuration(PedometerConfiguration { update_interval_ms: 250 })
            .unwrap_err();
        assert!(matches!(err, SensorError::InvalidState { .. }));
        assert_eq!(core.configuration(), PedometerConfiguration::default());

        core.stop_backend(&backend).await.unwrap();
        core.set_configuration(PedometerConfiguration { update_interval_ms: 250 }).unwrap();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        assert_eq!(
            backend.last_configuration(),
            Some(PedometerConfiguration { update_interval_ms: 250 })
        );
    }

    #[tokio::test]
    async fn test_late_events_dropped_after_restart() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);

        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        let stale = backend.current_sink().unwrap();
        core.stop_backend(&backend).await.unwrap();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        assert!(!stale.deliver(steps(1)));
        assert!(backend.emit(steps(2)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_cancels_start_in_flight() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);
        backend.hold_next_start();

        let starting = {
            let core = core.clone();
            let backend = backend.clone();
            tokio::spawn(async move { core.start_backend(&backend, SensorPayload::Pedometer).await })
        };
        backend.wait_for_start().await;
        assert!(!core.is_sensing());

        tokio::time::timeout(Duration::from_secs(1), core.stop_backend(&backend))
            .await
            .expect("stop must not wait for the backend")
            .unwrap();

        backend.release_start();
        let result = starting.await.unwrap();
        assert!(matches!(result, Err(SensorError::StartCancelled(SensorType::Pedometer))));
        assert!(!core.is_sensing());
        assert!(!backend.is_running());
        assert!(!backend.emit_late(steps(1)));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    /// Backend whose driver crashes while being acquired
    struct CrashingBackend;

    #[async_trait]
    impl SensorBackend for CrashingBackend {
        type Configuration = PedometerConfiguration;
        type Event = PedometerData;

        fn is_available(&self) -> bool {
            true
        }

        async fn start(
            &self,
            _configuration: &PedometerConfiguration,
            _sink: BackendSink<PedometerData>,
        ) -> Result<(), BackendError> {
            panic!("step counter driver crashed");
        }

        async fn stop(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_backend_start_leaves_idle() {
        let core = core();
        let count = counting(&core);

        let joined = {
            let core = core.clone();
            tokio::spawn(async move {
                core.start_backend(&CrashingBackend, SensorPayload::Pedometer).await
            })
            .await
        };
        assert!(joined.unwrap_err().is_panic());

        assert!(!core.is_sensing());
        assert_eq!(core.submit_sensor_data(SensorData::new(steps(1))), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let backend = Backend::new();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        assert!(core.is_sensing());
        assert!(backend.emit(steps(2)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_start_leaves_idle() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);
        backend.hold_next_start();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            core.start_backend(&backend, SensorPayload::Pedometer),
        )
        .await;
        assert!(timed_out.is_err());

        assert!(!core.is_sensing());
        assert_eq!(core.submit_sensor_data(SensorData::new(steps(1))), 0);
        assert!(!backend.emit_late(steps(1)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        core.set_configuration(PedometerConfiguration { update_interval_ms: 500 }).unwrap();
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();
        assert!(core.is_sensing());
        assert_eq!(backend.start_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_start_waits_for_first_then_fails() {
        let core = core();
        let backend = Backend::new();
        backend.hold_next_start();

        let first = {
            let core = core.clone();
            let backend = backend.clone();
            tokio::spawn(async move { core.start_backend(&backend, SensorPayload::Pedometer).await })
        };
        backend.wait_for_start().await;

        let second = {
            let core = core.clone();
            let backend = backend.clone();
            tokio::spawn(async move { core.start_backend(&backend, SensorPayload::Pedometer).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        backend.release_start();
        first.await.unwrap().unwrap();
        let err = second.await.unwrap().unwrap_err();
        assert!(matches!(err, SensorError::AlreadySensing(SensorType::Pedometer)));
        assert!(core.is_sensing());
        assert_eq!(backend.start_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subscription_churn_during_delivery() {
        const EVENTS: usize = 2_000;

        let core = core();
        let backend = Backend::new();
        let steady = counting(&core);
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        let delivering = {
            let backend = backend.clone();
            tokio::task::spawn_blocking(move || {
                (0..EVENTS as u64).filter(|&n| backend.emit(steps(n))).count()
            })
        };
        let churning = {
            let core = core.clone();
            tokio::task::spawn_blocking(move || {
                let churn = DataHandler::new(|_, _| {});
                for _ in 0..EVENTS {
                    assert!(core.subscribe_handler(&churn));
                    assert!(core.unsubscribe_handler(&churn));
                }
            })
        };

        let delivered = delivering.await.unwrap();
        churning.await.unwrap();

        assert_eq!(delivered, EVENTS);
        assert_eq!(steady.load(Ordering::SeqCst), EVENTS);
        assert_eq!(core.subscriber_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handler_may_submit_during_fan_out() {
        let core = core();
        let backend = Backend::new();
        let count = counting(&core);

        let resubmitted = Arc::new(AtomicBool::new(false));
        let echo = {
            let weak = Arc::downgrade(&core);
            let resubmitted = resubmitted.clone();
            DataHandler::new(move |_, data| {
                if resubmitted.swap(true, Ordering::SeqCst) {
                    return;
                }
                if let Some(core) = weak.upgrade() {
                    core.submit_sensor_data(data.clone());
                }
            })
        };
        core.subscribe_handler(&echo);
        core.start_backend(&backend, SensorPayload::Pedometer).await.unwrap();

        let emitted = {
            let backend = backend.clone();
            tokio::task::spawn_blocking(move || backend.emit(steps(1)))
        };
        let emitted = tokio::time::timeout(Duration::from_secs(1), emitted)
            .await
            .expect("fan-out must not deadlock")
            .unwrap();

        assert!(emitted);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
