//! # Temperature, Extended Range (PGN 130316)
//!
//! One temperature reading, sent every 2 s.
//!
//! ```text
//! Byte 0:    SID (0xFF, uncorrelated)
//! Byte 1:    Temperature instance
//! Byte 2:    Temperature source
//! Byte 3-5:  Actual temperature, 0.001 K/bit
//! Byte 6-7:  Set temperature, 0.1 K/bit (always "not available")
//! ```

use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Map};

use super::settings::{
    enum_property, integer_property, object_schema, read_enum, read_instance, require_keys, ConfigMap,
    Configurable,
};
use super::{MessageEncoder, PeriodicEncoder};
use crate::clock::ClockRef;
use crate::error::ConfigurationError;
use crate::flow::{Consumer, ExpiringField};
use crate::n2k::fields::PayloadBuilder;
use crate::n2k::protocol::*;
use crate::n2k::{N2kMessage, TemperatureSource};

/// Readings older than this are sent as "not available"
pub const TEMPERATURE_EXPIRY: Duration = Duration::from_millis(10_000);

/// Fields of PGN 130316
#[derive(Debug)]
pub struct TemperatureExt {
    temperature_instance: u8,
    temperature_source: TemperatureSource,
    /// K
    temperature: ExpiringField<Option<f64>>,
}

/// Periodic PGN 130316 sender
pub type TemperatureEncoder = PeriodicEncoder<TemperatureExt>;

impl TemperatureExt {
    /// Create a sensor with an unknown temperature
    pub fn new(temperature_instance: u8, temperature_source: TemperatureSource, clock: ClockRef) -> Self {
        Self {
            temperature_instance,
            temperature_source,
            temperature: ExpiringField::new(TEMPERATURE_EXPIRY, None, clock),
        }
    }

    /// Temperature instance
    pub fn temperature_instance(&self) -> u8 {
        self.temperature_instance
    }

    /// What the sensor measures
    pub fn temperature_source(&self) -> TemperatureSource {
        self.temperature_source
    }
}

impl MessageEncoder for TemperatureExt {
    const NAME: &'static str = "Temperature, Extended Range";
    const INTERVAL: Duration = Duration::from_millis(2000);

    fn build_message(&self) -> N2kMessage {
        let mut payload = PayloadBuilder::with_capacity(TEMPERATURE_EXTENDED_PAYLOAD_SIZE);
        payload
            .add_u8(N2K_SID_UNUSED)
            .add_u8(self.temperature_instance)
            .add_u8(self.temperature_source.code())
            .add_3byte_udouble(self.temperature.get(), 0.001)
            .add_2byte_udouble(None, 0.1);
        payload.finish(PGN_TEMPERATURE_EXTENDED, PRIORITY_TEMPERATURE)
    }
}

impl Configurable for TemperatureExt {
    fn config_schema(&self) -> serde_json::Value {
        let mut properties = Map::new();
        properties.insert("temperature_instance".into(), integer_property("Temperature instance"));
        properties.insert(
            "temperature_source".into(),
            enum_property("Temperature source", TemperatureSource::ALL.iter().map(|s| s.as_str())),
        );
        object_schema(properties)
    }

    fn set_configuration(&mut self, config: &ConfigMap) -> Result<(), ConfigurationError> {
        require_keys(Self::NAME, config, &["temperature_instance", "temperature_source"])?;
        let instance = read_instance(config, "temperature_instance", u8::MAX)?;
        let source = read_enum(config, "temperature_source")?;

        self.temperature_instance = instance;
        self.temperature_source = source;
        Ok(())
    }

    fn configuration(&self) -> ConfigMap {
        let mut config = Map::new();
        config.insert("temperature_instance".into(), json!(self.temperature_instance));
        config.insert("temperature_source".into(), json!(self.temperature_source.as_str()));
        config
    }
}

impl PeriodicEncoder<TemperatureExt> {
    /// Temperature input, kelvin
    pub fn temperature_consumer(&self) -> Rc<dyn Consumer<f64>> {
        self.consumer(|e: &mut TemperatureExt, v: f64| e.temperature.update(Some(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::encoders::Scheduler;
    use crate::flow::RateLimiter;
    use crate::transport::RecordingTransport;

    #[test]
    fn test_layout() {
        let clock = ManualClock::new();
        let encoder = TemperatureEncoder::new(TemperatureExt::new(
            3,
            TemperatureSource::ExhaustGas,
            clock.clone(),
        ));

        encoder.temperature_consumer().set_input(300.15);

        let msg = encoder.build_message();
        assert_eq!(msg.pgn, 130316);
        assert_eq!(msg.priority, 5);
        assert_eq!(
            msg.payload.as_ref(),
            &[0xFF, 0x03, 0x0E, 0x76, 0x94, 0x04, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_never_updated_is_not_available() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let mut transport = RecordingTransport::new();
        let mut encoder = TemperatureEncoder::new(TemperatureExt::new(0, TemperatureSource::Sea, clock.clone()));
        encoder.enable(&mut scheduler);

        clock.advance(Duration::from_millis(1999));
        scheduler.run_due(&mut transport);
        assert!(transport.messages().is_empty());

        clock.advance(Duration::from_millis(1));
        scheduler.run_due(&mut transport);
        assert_eq!(
            transport.messages()[0].payload.as_ref(),
            &[0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_rate_limited_sensor_feed() {
        let clock = ManualClock::new();
        let encoder = TemperatureEncoder::new(TemperatureExt::new(0, TemperatureSource::EngineRoom, clock.clone()));
        let limiter = RateLimiter::new(Duration::from_millis(1000), clock.clone());
        limiter.connect_to(encoder.temperature_consumer());

        limiter.push(300.0);
        clock.advance(Duration::from_millis(500));
        limiter.push(310.0);

        // 300 K = 300000 = 0x0493E0
        assert_eq!(&encoder.build_message().payload[3..6], &[0xE0, 0x93, 0x04]);
    }

    #[test]
    fn test_configuration_round_trip() {
        let clock = ManualClock::new();
        let encoder = TemperatureEncoder::new(TemperatureExt::new(0, TemperatureSource::Sea, clock.clone()));
        let config = json!({
            "temperature_instance": 7,
            "temperature_source": "Freezer Temperature"
        })
        .as_object()
        .cloned()
        .unwrap();

        encoder.set_configuration(&config).unwrap();

        assert_eq!(encoder.configuration(), config);
        assert_eq!(encoder.with(|e| e.temperature_source()), TemperatureSource::Freezer);
        assert_eq!(encoder.build_message().payload[2], 13);
    }

    #[test]
    fn test_unknown_source_changes_nothing() {
        let clock = ManualClock::new();
        let encoder = TemperatureEncoder::new(TemperatureExt::new(2, TemperatureSource::Sea, clock.clone()));
        let config = json!({ "temperature_instance": 9, "temperature_source": "Lava Temperature" })
            .as_object()
            .cloned()
            .unwrap();

        let result = encoder.set_configuration(&config);

        assert!(matches!(result, Err(ConfigurationError::UnknownEnumValue { .. })));
        assert_eq!(encoder.with(|e| e.temperature_instance()), 2);
        assert_eq!(encoder.with(|e| e.temperature_source()), TemperatureSource::Sea);
    }

    #[test]
    fn test_schema_lists_sources() {
        let clock = ManualClock::new();
        let encoder = TemperatureEncoder::new(TemperatureExt::new(0, TemperatureSource::Sea, clock.clone()));

        let schema = encoder.config_schema();
        let sources = schema["properties"]["temperature_source"]["enum"].as_array().unwrap();
        assert_eq!(sources.len(), 16);
        assert_eq!(sources[0], "Sea Temperature");
    }
}
