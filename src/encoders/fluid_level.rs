//! # Fluid Level (PGN 127505)
//!
//! Tank level, sent every 2.5 s.
//!
//! ```text
//! Byte 0:    Tank instance (bits 0-3) | fluid type (bits 4-7)
//! Byte 1-2:  Level, 0.004 %/bit (signed)
//! Byte 3-6:  Capacity, 0.1 L/bit
//! Byte 7:    Reserved (0xFF)
//! ```

use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Map};
use tracing::warn;

use super::settings::{
    enum_property, integer_property, number_property, number_value, object_schema, read_enum,
    read_instance, read_non_negative, require_keys, ConfigMap, Configurable,
};
use super::{MessageEncoder, PeriodicEncoder};
use crate::clock::ClockRef;
use crate::error::ConfigurationError;
use crate::flow::{Consumer, ExpiringField};
use crate::n2k::fields::PayloadBuilder;
use crate::n2k::protocol::*;
use crate::n2k::{FluidType, N2kMessage};

/// Level readings older than this are sent as "not available"
pub const FLUID_LEVEL_EXPIRY: Duration = Duration::from_millis(10_000);

/// Tank instance shares its byte with the fluid type
pub const MAX_TANK_INSTANCE: u8 = 0x0F;

/// Fields of PGN 127505
#[derive(Debug)]
pub struct FluidLevel {
    tank_instance: u8,
    tank_type: FluidType,
    /// liters
    tank_capacity: f64,
    /// percent
    tank_level: ExpiringField<Option<f64>>,
}

/// Periodic PGN 127505 sender
pub type FluidLevelEncoder = PeriodicEncoder<FluidLevel>;

impl FluidLevel {
    /// Create a tank with an unknown level.
    ///
    /// Instances above 15 do not fit the wire format and are clamped to 15
    /// with a warning. `set_configuration` rejects them instead.
    pub fn new(tank_instance: u8, tank_type: FluidType, tank_capacity: f64, clock: ClockRef) -> Self {
        if tank_instance > MAX_TANK_INSTANCE {
            warn!(
                "Tank instance {} does not fit in 4 bits, using {}",
                tank_instance, MAX_TANK_INSTANCE
            );
        }
        Self {
            tank_instance: tank_instance.min(MAX_TANK_INSTANCE),
            tank_type,
            tank_capacity,
            tank_level: ExpiringField::new(FLUID_LEVEL_EXPIRY, None, clock),
        }
    }

    /// Tank instance, 0 to 15
    pub fn tank_instance(&self) -> u8 {
        self.tank_instance
    }

    /// Fluid held by the tank
    pub fn tank_type(&self) -> FluidType {
        self.tank_type
    }

    /// Capacity in liters
    pub fn tank_capacity(&self) -> f64 {
        self.tank_capacity
    }

    /// Level in percent, `None` when unknown or stale
    pub fn tank_level(&self) -> Option<f64> {
        self.tank_level.get()
    }
}

impl MessageEncoder for FluidLevel {
    const NAME: &'static str = "Fluid Level";
    const INTERVAL: Duration = Duration::from_millis(2500);

    fn build_message(&self) -> N2kMessage {
        let mut payload = PayloadBuilder::with_capacity(FLUID_LEVEL_PAYLOAD_SIZE);
        payload
            .add_u8((self.tank_instance & MAX_TANK_INSTANCE) | (self.tank_type.code() << 4))
            .add_2byte_double(self.tank_level.get(), 0.004)
            .add_4byte_udouble(Some(self.tank_capacity), 0.1)
            .add_u8(N2K_UINT8_NA);
        payload.finish(PGN_FLUID_LEVEL, PRIORITY_FLUID_LEVEL)
    }
}

impl Configurable for FluidLevel {
    fn config_schema(&self) -> serde_json::Value {
        let mut properties = Map::new();
        properties.insert("tank_instance".into(), integer_property("Tank instance"));
        properties.insert(
            "tank_type".into(),
            enum_property("Tank type", FluidType::ALL.iter().map(|t| t.as_str())),
        );
        properties.insert("tank_capacity".into(), number_property("Tank capacity (liters)"));
        object_schema(properties)
    }

    fn set_configuration(&mut self, config: &ConfigMap) -> Result<(), ConfigurationError> {
        require_keys(Self::NAME, config, &["tank_instance", "tank_type", "tank_capacity"])?;
        let tank_instance = read_instance(config, "tank_instance", MAX_TANK_INSTANCE)?;
        let tank_type = read_enum(config, "tank_type")?;
        let tank_capacity = read_non_negative(config, "tank_capacity")?;

        self.tank_instance = tank_instance;
        self.tank_type = tank_type;
        self.tank_capacity = tank_capacity;
        Ok(())
    }

    fn configuration(&self) -> ConfigMap {
        let mut config = Map::new();
        config.insert("tank_instance".into(), json!(self.tank_instance));
        config.insert("tank_type".into(), json!(self.tank_type.as_str()));
        config.insert("tank_capacity".into(), number_value(self.tank_capacity));
        config
    }
}

impl PeriodicEncoder<FluidLevel> {
    /// Tank level input as a ratio, 0.0 (empty) to 1.0 (full)
    pub fn tank_level_consumer(&self) -> Rc<dyn Consumer<f64>> {
        self.consumer(|e: &mut FluidLevel, ratio: f64| e.tank_level.update(Some(100.0 * ratio)))
    }
}
