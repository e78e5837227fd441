//! # Periodic Encoders Module
//!
//! Encoders own a set of expiring fields and, once enabled, transmit one
//! message per fixed interval whether or not fresh data arrived. Stale fields
//! go out as "not available".
//!
//! This module handles:
//! - The cooperative [`Scheduler`] driving every encoder
//! - The shared enable/disable and field-binding logic ([`PeriodicEncoder`])
//! - PGN 127488 Engine Parameters, Rapid Update ([`rapid`])
//! - PGN 127489 Engine Parameters, Dynamic ([`dynamic`])
//! - PGN 127505 Fluid Level ([`fluid_level`])
//! - PGN 130316 Temperature, Extended Range ([`temperature`])
//! - Runtime configuration ([`settings`])
//!
//! ## Usage
//!
//! ```
//! use n2k_bridge::clock::ManualClock;
//! use n2k_bridge::encoders::{Scheduler, PeriodicEncoder};
//! use n2k_bridge::encoders::fluid_level::FluidLevel;
//! use n2k_bridge::flow::Consumer;
//! use n2k_bridge::n2k::FluidType;
//! use n2k_bridge::transport::RecordingTransport;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut scheduler = Scheduler::new(clock.clone());
//! let mut transport = RecordingTransport::new();
//!
//! let mut tank = PeriodicEncoder::new(FluidLevel::new(0, FluidType::Fuel, 200.0, clock.clone()));
//! tank.enable(&mut scheduler);
//! tank.tank_level_consumer().set_input(0.5);
//!
//! clock.advance(Duration::from_millis(2500));
//! scheduler.run_due(&mut transport);
//! assert_eq!(transport.messages().len(), 1);
//! ```

pub mod dynamic;
pub mod fluid_level;
pub mod rapid;
pub mod scheduler;
pub mod settings;
pub mod temperature;

pub use scheduler::{Scheduler, TaskId};
pub use settings::{ConfigMap, Configurable};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, trace, warn};

use crate::error::ConfigurationError;
use crate::flow::Consumer;
use crate::n2k::N2kMessage;
use crate::transport::Transport;

/// Message-specific half of a periodic encoder
pub trait MessageEncoder: 'static {
    /// Human readable name used in logs
    const NAME: &'static str;

    /// Transmit interval mandated by the protocol
    const INTERVAL: Duration;

    /// Read every field (applying expiry) and pack one message
    fn build_message(&self) -> N2kMessage;
}

/// Schedules a [`MessageEncoder`] and binds producers to its fields.
///
/// Enabling registers exactly one repeating task; enabling again is a no-op,
/// as is disabling an encoder that is not enabled.
pub struct PeriodicEncoder<E> {
    state: Rc<RefCell<E>>,
    task: Option<TaskId>,
}

impl<E: MessageEncoder> PeriodicEncoder<E> {
    /// Wrap an encoder. It starts disabled.
    pub fn new(encoder: E) -> Self {
        Self {
            state: Rc::new(RefCell::new(encoder)),
            task: None,
        }
    }

    /// Start transmitting on the scheduler
    pub fn enable(&mut self, scheduler: &mut Scheduler) {
        if self.task.is_some() {
            return;
        }

        let state = Rc::clone(&self.state);
        let id = scheduler.on_repeat(E::INTERVAL, move |transport| {
            let message = state.borrow().build_message();
            trace!("{}: sending PGN {}", E::NAME, message.pgn);
            transport.send(&message);
        });
        self.task = Some(id);

        info!("{} enabled ({} ms cadence)", E::NAME, E::INTERVAL.as_millis());
    }

    /// Stop transmitting. Future ticks are suppressed.
    pub fn disable(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.task.take() {
            scheduler.remove(id);
            info!("{} disabled", E::NAME);
        }
    }

    /// Whether a task is registered
    pub fn is_enabled(&self) -> bool {
        self.task.is_some()
    }

    /// Build the message the next tick would send
    pub fn build_message(&self) -> N2kMessage {
        self.state.borrow().build_message()
    }

    /// Build and send one message immediately, outside the schedule
    pub fn tick_now(&self, transport: &mut dyn Transport) {
        let message = self.build_message();
        trace!("{}: immediate send of PGN {}", E::NAME, message.pgn);
        transport.send(&message);
    }

    /// Read access to the encoder state
    pub fn with<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&*self.state.borrow())
    }

    /// Bind a producer to one field.
    ///
    /// `update` receives the encoder state and the pushed value; it is the
    /// only path by which fields are mutated.
    pub fn consumer<T, F>(&self, update: F) -> Rc<dyn Consumer<T>>
    where
        T: 'static,
        F: Fn(&mut E, T) + 'static,
    {
        let state = Rc::clone(&self.state);
        Rc::new(move |value: T| update(&mut *state.borrow_mut(), value))
    }
}

impl<E: MessageEncoder + Configurable> PeriodicEncoder<E> {
    /// JSON schema of the configuration keys
    pub fn config_schema(&self) -> Value {
        self.state.borrow().config_schema()
    }

    /// Apply a configuration map
    ///
    /// # Errors
    ///
    /// Returns the first validation error; nothing is changed in that case
    pub fn set_configuration(&self, config: &ConfigMap) -> Result<(), ConfigurationError> {
        let result = self.state.borrow_mut().set_configuration(config);
        if let Err(e) = &result {
            warn!("{}: configuration rejected: {}", E::NAME, e);
        }
        result
    }

    /// Current configuration
    pub fn configuration(&self) -> ConfigMap {
        self.state.borrow().configuration()
    }
}

impl<E> std::fmt::Debug for PeriodicEncoder<E>
where
    E: MessageEncoder,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicEncoder")
            .field("name", &E::NAME)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockRef, ManualClock};
    use crate::flow::ExpiringField;
    use crate::transport::{MockTransport, RecordingTransport};
    use bytes::Bytes;

    /// One-field encoder used to exercise the shared logic
    struct Probe {
        reading: ExpiringField<Option<u8>>,
    }

    impl Probe {
        fn new(clock: ClockRef) -> Self {
            Self {
                reading: ExpiringField::new(Duration::from_millis(300), None, clock),
            }
        }
    }

    impl MessageEncoder for Probe {
        const NAME: &'static str = "Probe";
        const INTERVAL: Duration = Duration::from_millis(100);

        fn build_message(&self) -> N2kMessage {
            let byte = self.reading.get().unwrap_or(0xFF);
            N2kMessage {
                pgn: 1,
                priority: 7,
                payload: Bytes::copy_from_slice(&[byte]),
            }
        }
    }

    #[test]
    fn test_disabled_encoder_sends_nothing() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let encoder = PeriodicEncoder::new(Probe::new(clock.clone()));

        let mut mock = MockTransport::new();
        mock.expect_send().times(0);

        clock.advance(Duration::from_secs(1));
        scheduler.run_due(&mut mock);
        assert!(!encoder.is_enabled());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut encoder = PeriodicEncoder::new(Probe::new(clock.clone()));

        encoder.enable(&mut scheduler);
        encoder.enable(&mut scheduler);
        assert_eq!(scheduler.len(), 1);

        let mut mock = MockTransport::new();
        mock.expect_send().times(1).return_const(());
        clock.advance(Duration::from_millis(100));
        scheduler.run_due(&mut mock);
    }

    #[test]
    fn test_disable_is_idempotent_and_stops_ticks() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = PeriodicEncoder::new(Probe::new(clock.clone()));

        encoder.disable(&mut scheduler);
        encoder.enable(&mut scheduler);
        clock.advance(Duration::from_millis(100));
        scheduler.run_due(&mut transport);

        encoder.disable(&mut scheduler);
        encoder.disable(&mut scheduler);
        assert!(!encoder.is_enabled());
        assert!(scheduler.is_empty());

        clock.advance(Duration::from_millis(500));
        scheduler.run_due(&mut transport);
        assert_eq!(transport.messages().len(), 1);

        encoder.enable(&mut scheduler);
        assert!(encoder.is_enabled());
    }

    #[test]
    fn test_tick_sends_sentinel_when_never_updated() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = PeriodicEncoder::new(Probe::new(clock.clone()));
        encoder.enable(&mut scheduler);

        clock.advance(Duration::from_millis(100));
        scheduler.run_due(&mut transport);

        assert_eq!(transport.messages().len(), 1);
        assert_eq!(transport.messages()[0].payload.as_ref(), &[0xFF]);
    }

    #[test]
    fn test_consumer_updates_field_and_expiry_applies_per_tick() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = PeriodicEncoder::new(Probe::new(clock.clone()));
        let input = encoder.consumer(|p: &mut Probe, v: u8| p.reading.update(Some(v)));
        encoder.enable(&mut scheduler);

        input.set_input(42);
        for _ in 0..5 {
            clock.advance(Duration::from_millis(100));
            scheduler.run_due(&mut transport);
        }

        let payloads: Vec<u8> = transport.messages().iter().map(|m| m.payload[0]).collect();
        assert_eq!(payloads, vec![42, 42, 42, 0xFF, 0xFF]);
        assert!(encoder.with(|p| p.reading.is_expired()));
    }

    #[test]
    fn test_push_before_tick_is_visible_to_that_tick() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = PeriodicEncoder::new(Probe::new(clock.clone()));
        let input = encoder.consumer(|p: &mut Probe, v: u8| p.reading.update(Some(v)));
        encoder.enable(&mut scheduler);

        clock.advance(Duration::from_millis(100));
        input.set_input(7);
        scheduler.run_due(&mut transport);

        assert_eq!(transport.messages()[0].payload[0], 7);
        assert_eq!(encoder.build_message().payload[0], 7);
    }

    #[test]
    fn test_tick_now_sends_once_without_scheduling() {
        let clock = ManualClock::new();
        let encoder = PeriodicEncoder::new(Probe::new(clock.clone()));

        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|m: &N2kMessage| m.pgn == 1 && m.payload[..] == [0xFF_u8])
            .times(1)
            .return_const(());

        encoder.tick_now(&mut mock);
        assert!(!encoder.is_enabled());
    }
}
