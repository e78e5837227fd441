//! # Engine Parameters, Rapid Update (PGN 127488)
//!
//! Engine speed, boost pressure and tilt/trim, sent every 100 ms.
//!
//! ```text
//! Byte 0:    Engine instance
//! Byte 1-2:  Engine speed, 0.25 rpm/bit
//! Byte 3-4:  Boost pressure, 100 Pa/bit
//! Byte 5:    Tilt/trim, % (signed)
//! Byte 6-7:  Reserved (0xFF)
//! ```

use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Map};

use super::settings::{integer_property, object_schema, read_instance, require_keys, ConfigMap, Configurable};
use super::{MessageEncoder, PeriodicEncoder};
use crate::clock::ClockRef;
use crate::error::ConfigurationError;
use crate::flow::{Consumer, ExpiringField};
use crate::n2k::fields::PayloadBuilder;
use crate::n2k::protocol::*;
use crate::n2k::N2kMessage;

/// Inputs older than this are sent as "not available"
pub const RAPID_EXPIRY: Duration = Duration::from_millis(1000);

/// Fields of PGN 127488
#[derive(Debug)]
pub struct RapidUpdate {
    engine_instance: u8,
    /// rpm
    engine_speed: ExpiringField<Option<f64>>,
    /// Pa
    boost_pressure: ExpiringField<Option<f64>>,
    /// percent
    tilt_trim: ExpiringField<Option<i8>>,
}

/// Periodic PGN 127488 sender
pub type RapidUpdateEncoder = PeriodicEncoder<RapidUpdate>;

impl RapidUpdate {
    /// Create the field set with every input unavailable
    pub fn new(engine_instance: u8, clock: ClockRef) -> Self {
        Self {
            engine_instance,
            engine_speed: ExpiringField::new(RAPID_EXPIRY, None, Rc::clone(&clock)),
            boost_pressure: ExpiringField::new(RAPID_EXPIRY, None, Rc::clone(&clock)),
            tilt_trim: ExpiringField::new(RAPID_EXPIRY, None, clock),
        }
    }

    /// Engine instance
    pub fn engine_instance(&self) -> u8 {
        self.engine_instance
    }
}

impl MessageEncoder for RapidUpdate {
    const NAME: &'static str = "Engine Parameters, Rapid Update";
    const INTERVAL: Duration = Duration::from_millis(100);

    fn build_message(&self) -> N2kMessage {
        let mut payload = PayloadBuilder::with_capacity(ENGINE_RAPID_PAYLOAD_SIZE);
        payload
            .add_u8(self.engine_instance)
            .add_2byte_udouble(self.engine_speed.get(), 0.25)
            .add_2byte_udouble(self.boost_pressure.get(), 100.0)
            .add_i8(self.tilt_trim.get())
            .add_u8(N2K_UINT8_NA)
            .add_u8(N2K_UINT8_NA);
        payload.finish(PGN_ENGINE_PARAMETERS_RAPID, PRIORITY_ENGINE_RAPID)
    }
}

impl Configurable for RapidUpdate {
    fn config_schema(&self) -> serde_json::Value {
        let mut properties = Map::new();
        properties.insert("engine_instance".into(), integer_property("Engine instance"));
        object_schema(properties)
    }

    fn set_configuration(&mut self, config: &ConfigMap) -> Result<(), ConfigurationError> {
        require_keys(Self::NAME, config, &["engine_instance"])?;
        self.engine_instance = read_instance(config, "engine_instance", u8::MAX)?;
        Ok(())
    }

    fn configuration(&self) -> ConfigMap {
        let mut config = Map::new();
        config.insert("engine_instance".into(), json!(self.engine_instance));
        config
    }
}

impl PeriodicEncoder<RapidUpdate> {
    /// Engine speed input, rpm
    pub fn engine_speed_consumer(&self) -> Rc<dyn Consumer<f64>> {
        self.consumer(|e: &mut RapidUpdate, v: f64| e.engine_speed.update(Some(v)))
    }

    /// Turbocharger boost pressure input, Pa
    pub fn boost_pressure_consumer(&self) -> Rc<dyn Consumer<f64>> {
        self.consumer(|e: &mut RapidUpdate, v: f64| e.boost_pressure.update(Some(v)))
    }

    /// Tilt/trim input, percent
    pub fn tilt_trim_consumer(&self) -> Rc<dyn Consumer<i8>> {
        self.consumer(|e: &mut RapidUpdate, v: i8| e.tilt_trim.update(Some(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::encoders::Scheduler;
    use crate::transport::RecordingTransport;

    #[test]
    fn test_layout_with_fresh_values() {
        let clock = ManualClock::new();
        let encoder = RapidUpdateEncoder::new(RapidUpdate::new(1, clock.clone()));

        encoder.engine_speed_consumer().set_input(1500.0);
        encoder.boost_pressure_consumer().set_input(150_000.0);
        encoder.tilt_trim_consumer().set_input(-10);

        let msg = encoder.build_message();
        assert_eq!(msg.pgn, 127488);
        assert_eq!(msg.priority, 2);
        assert_eq!(
            msg.payload.as_ref(),
            &[0x01, 0x70, 0x17, 0xDC, 0x05, 0xF6, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_all_not_available_when_never_updated() {
        let clock = ManualClock::new();
        let encoder = RapidUpdateEncoder::new(RapidUpdate::new(0, clock.clone()));

        let msg = encoder.build_message();
        assert_eq!(msg.payload.len(), ENGINE_RAPID_PAYLOAD_SIZE);
        assert_eq!(
            msg.payload.as_ref(),
            &[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_fields_expire_independently() {
        let clock = ManualClock::new();
        let encoder = RapidUpdateEncoder::new(RapidUpdate::new(0, clock.clone()));

        encoder.engine_speed_consumer().set_input(1000.0);
        clock.advance(Duration::from_millis(800));
        encoder.tilt_trim_consumer().set_input(5);
        clock.advance(Duration::from_millis(400));

        let msg = encoder.build_message();
        assert_eq!(&msg.payload[1..3], &[0xFF, 0xFF], "speed is 1.2 s old");
        assert_eq!(msg.payload[5], 5, "tilt/trim is 0.4 s old");
    }

    #[test]
    fn test_ten_messages_per_second() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = RapidUpdateEncoder::new(RapidUpdate::new(0, clock.clone()));
        encoder.enable(&mut scheduler);

        for _ in 0..100 {
            clock.advance(Duration::from_millis(10));
            scheduler.run_due(&mut transport);
        }

        assert_eq!(transport.with_pgn(PGN_ENGINE_PARAMETERS_RAPID).len(), 10);
    }

    #[test]
    fn test_configuration_round_trip() {
        let clock = ManualClock::new();
        let encoder = RapidUpdateEncoder::new(RapidUpdate::new(0, clock.clone()));

        let config = json!({ "engine_instance": 3 }).as_object().cloned().unwrap();
        encoder.set_configuration(&config).unwrap();

        assert_eq!(encoder.configuration(), config);
        assert_eq!(encoder.build_message().payload[0], 3);
        assert_eq!(encoder.config_schema()["properties"]["engine_instance"]["type"], "integer");
    }

    #[test]
    fn test_missing_key_keeps_instance() {
        let clock = ManualClock::new();
        let encoder = RapidUpdateEncoder::new(RapidUpdate::new(2, clock.clone()));

        let result = encoder.set_configuration(&Map::new());

        assert_eq!(result, Err(ConfigurationError::MissingKey("engine_instance".to_string())));
        assert_eq!(encoder.with(|e| e.engine_instance()), 2);
    }
}
