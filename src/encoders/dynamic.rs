//! # Engine Parameters, Dynamic (PGN 127489)
//!
//! Slowly changing engine readings plus two discrete status words, sent
//! every 500 ms as a 26-byte fast-packet message.
//!
//! ```text
//! Byte 0:      Engine instance
//! Byte 1-2:    Oil pressure, 100 Pa/bit
//! Byte 3-4:    Oil temperature, 0.1 K/bit
//! Byte 5-6:    Coolant temperature, 0.01 K/bit
//! Byte 7-8:    Alternator voltage, 0.01 V/bit (signed)
//! Byte 9-10:   Fuel rate, 0.1 L/h/bit (signed)
//! Byte 11-14:  Total engine hours, 1 s/bit
//! Byte 15-16:  Coolant pressure, 100 Pa/bit
//! Byte 17-18:  Fuel pressure, 1000 Pa/bit
//! Byte 19:     Reserved (0xFF)
//! Byte 20-21:  Discrete status 1
//! Byte 22-23:  Discrete status 2
//! Byte 24:     Engine load, % (signed)
//! Byte 25:     Engine torque, % (signed)
//! ```
//!
//! Every status bit is its own expiring boolean; an alarm that stops being
//! reported falls back to "clear" after the expiry window.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use serde_json::{json, Map};

use super::settings::{integer_property, object_schema, read_instance, require_keys, ConfigMap, Configurable};
use super::{MessageEncoder, PeriodicEncoder};
use crate::clock::ClockRef;
use crate::error::ConfigurationError;
use crate::flow::{Consumer, ExpiringField};
use crate::n2k::fields::PayloadBuilder;
use crate::n2k::protocol::*;
use crate::n2k::types::UnknownCategory;
use crate::n2k::N2kMessage;

/// Inputs older than this are sent as "not available" (or "clear" for alarms)
pub const DYNAMIC_EXPIRY: Duration = Duration::from_millis(5000);

/// Numeric engine readings, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineParameter {
    /// Pa
    OilPressure,
    /// K
    OilTemperature,
    /// K
    CoolantTemperature,
    /// V
    AlternatorVoltage,
    /// L/h
    FuelRate,
    /// s
    EngineHours,
    /// Pa
    CoolantPressure,
    /// Pa
    FuelPressure,
}

impl EngineParameter {
    /// Every parameter, in payload order
    pub const ALL: [EngineParameter; 8] = [
        EngineParameter::OilPressure,
        EngineParameter::OilTemperature,
        EngineParameter::CoolantTemperature,
        EngineParameter::AlternatorVoltage,
        EngineParameter::FuelRate,
        EngineParameter::EngineHours,
        EngineParameter::CoolantPressure,
        EngineParameter::FuelPressure,
    ];

    /// Input name
    pub fn as_str(self) -> &'static str {
        match self {
            EngineParameter::OilPressure => "oil_pressure",
            EngineParameter::OilTemperature => "oil_temperature",
            EngineParameter::CoolantTemperature => "coolant_temperature",
            EngineParameter::AlternatorVoltage => "alternator_voltage",
            EngineParameter::FuelRate => "fuel_rate",
            EngineParameter::EngineHours => "engine_hours",
            EngineParameter::CoolantPressure => "coolant_pressure",
            EngineParameter::FuelPressure => "fuel_pressure",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for EngineParameter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for EngineParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two discrete status words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusWord {
    Status1,
    Status2,
}

/// Engine alarm and indicator bits.
///
/// Declaration order is the wire order: the first sixteen fill status 1
/// from bit 0 upwards, the remaining eight fill status 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineAlarm {
    CheckEngine,
    OverTemperature,
    LowOilPressure,
    LowOilLevel,
    LowFuelPressure,
    LowSystemVoltage,
    LowCoolantLevel,
    WaterFlow,
    WaterInFuel,
    ChargeIndicator,
    PreheatIndicator,
    HighBoostPressure,
    RevLimitExceeded,
    EgrSystem,
    ThrottlePositionSensor,
    EmergencyStop,
    WarningLevel1,
    WarningLevel2,
    LowOilPowerReduction,
    MaintenanceNeeded,
    EngineCommError,
    SubOrSecondaryThrottle,
    NeutralStartProtect,
    EngineShuttingDown,
}

impl EngineAlarm {
    /// Every alarm, status-1 bits 0-15 then status-2 bits 0-7
    pub const ALL: [EngineAlarm; 24] = [
        EngineAlarm::CheckEngine,
        EngineAlarm::OverTemperature,
        EngineAlarm::LowOilPressure,
        EngineAlarm::LowOilLevel,
        EngineAlarm::LowFuelPressure,
        EngineAlarm::LowSystemVoltage,
        EngineAlarm::LowCoolantLevel,
        EngineAlarm::WaterFlow,
        EngineAlarm::WaterInFuel,
        EngineAlarm::ChargeIndicator,
        EngineAlarm::PreheatIndicator,
        EngineAlarm::HighBoostPressure,
        EngineAlarm::RevLimitExceeded,
        EngineAlarm::EgrSystem,
        EngineAlarm::ThrottlePositionSensor,
        EngineAlarm::EmergencyStop,
        EngineAlarm::WarningLevel1,
        EngineAlarm::WarningLevel2,
        EngineAlarm::LowOilPowerReduction,
        EngineAlarm::MaintenanceNeeded,
        EngineAlarm::EngineCommError,
        EngineAlarm::SubOrSecondaryThrottle,
        EngineAlarm::NeutralStartProtect,
        EngineAlarm::EngineShuttingDown,
    ];

    /// Input name
    pub fn as_str(self) -> &'static str {
        match self {
            EngineAlarm::CheckEngine => "check_engine",
            EngineAlarm::OverTemperature => "over_temperature",
            EngineAlarm::LowOilPressure => "low_oil_pressure",
            EngineAlarm::LowOilLevel => "low_oil_level",
            EngineAlarm::LowFuelPressure => "low_fuel_pressure",
            EngineAlarm::LowSystemVoltage => "low_system_voltage",
            EngineAlarm::LowCoolantLevel => "low_coolant_level",
            EngineAlarm::WaterFlow => "water_flow",
            EngineAlarm::WaterInFuel => "water_in_fuel",
            EngineAlarm::ChargeIndicator => "charge_indicator",
            EngineAlarm::PreheatIndicator => "preheat_indicator",
            EngineAlarm::HighBoostPressure => "high_boost_pressure",
            EngineAlarm::RevLimitExceeded => "rev_limit_exceeded",
            EngineAlarm::EgrSystem => "egr_system",
            EngineAlarm::ThrottlePositionSensor => "throttle_position_sensor",
            EngineAlarm::EmergencyStop => "emergency_stop",
            EngineAlarm::WarningLevel1 => "warning_level_1",
            EngineAlarm::WarningLevel2 => "warning_level_2",
            EngineAlarm::LowOilPowerReduction => "low_oil_power_reduction",
            EngineAlarm::MaintenanceNeeded => "maintenance_needed",
            EngineAlarm::EngineCommError => "engine_comm_error",
            EngineAlarm::SubOrSecondaryThrottle => "sub_or_secondary_throttle",
            EngineAlarm::NeutralStartProtect => "neutral_start_protect",
            EngineAlarm::EngineShuttingDown => "engine_shutting_down",
        }
    }

    /// Status word carrying this bit
    pub fn word(self) -> StatusWord {
        if self.index() < 16 {
            StatusWord::Status1
        } else {
            StatusWord::Status2
        }
    }

    /// Bit position within its word
    pub fn bit(self) -> u8 {
        (self.index() % 16) as u8
    }

    /// Mask within its word
    pub fn mask(self) -> u16 {
        1 << self.bit()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for EngineAlarm {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for EngineAlarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of PGN 127489
#[derive(Debug)]
pub struct EngineDynamic {
    engine_instance: u8,
    parameters: [ExpiringField<Option<f64>>; 8],
    engine_load: ExpiringField<Option<i8>>,
    engine_torque: ExpiringField<Option<i8>>,
    alarms: [ExpiringField<bool>; 24],
}

/// Periodic PGN 127489 sender
pub type DynamicParameterEncoder = PeriodicEncoder<EngineDynamic>;

impl EngineDynamic {
    /// Create the field set with every reading unavailable and every alarm clear
    pub fn new(engine_instance: u8, clock: ClockRef) -> Self {
        Self {
            engine_instance,
            parameters: std::array::from_fn(|_| ExpiringField::new(DYNAMIC_EXPIRY, None, Rc::clone(&clock))),
            engine_load: ExpiringField::new(DYNAMIC_EXPIRY, None, Rc::clone(&clock)),
            engine_torque: ExpiringField::new(DYNAMIC_EXPIRY, None, Rc::clone(&clock)),
            alarms: std::array::from_fn(|_| ExpiringField::new(DYNAMIC_EXPIRY, false, Rc::clone(&clock))),
        }
    }

    /// Engine instance
    pub fn engine_instance(&self) -> u8 {
        self.engine_instance
    }

    /// Current reading of one parameter, `None` when unavailable
    pub fn parameter(&self, parameter: EngineParameter) -> Option<f64> {
        self.parameters[parameter.index()].get()
    }

    /// Current state of one alarm, `false` once expired
    pub fn alarm(&self, alarm: EngineAlarm) -> bool {
        self.alarms[alarm.index()].get()
    }

    /// Pack the alarms belonging to `word`
    pub fn status_word(&self, word: StatusWord) -> u16 {
        EngineAlarm::ALL
            .into_iter()
            .filter(|a| a.word() == word && self.alarm(*a))
            .fold(0, |bits, a| bits | a.mask())
    }

    /// Discrete status 1
    pub fn status_1(&self) -> u16 {
        self.status_word(StatusWord::Status1)
    }

    /// Discrete status 2
    pub fn status_2(&self) -> u16 {
        self.status_word(StatusWord::Status2)
    }
}

impl MessageEncoder for EngineDynamic {
    const NAME: &'static str = "Engine Parameters, Dynamic";
    const INTERVAL: Duration = Duration::from_millis(500);

    fn build_message(&self) -> N2kMessage {
        use EngineParameter::*;

        let mut payload = PayloadBuilder::with_capacity(ENGINE_DYNAMIC_PAYLOAD_SIZE);
        payload
            .add_u8(self.engine_instance)
            .add_2byte_udouble(self.parameter(OilPressure), 100.0)
            .add_2byte_udouble(self.parameter(OilTemperature), 0.1)
            .add_2byte_udouble(self.parameter(CoolantTemperature), 0.01)
            .add_2byte_double(self.parameter(AlternatorVoltage), 0.01)
            .add_2byte_double(self.parameter(FuelRate), 0.1)
            .add_4byte_udouble(self.parameter(EngineHours), 1.0)
            .add_2byte_udouble(self.parameter(CoolantPressure), 100.0)
            .add_2byte_udouble(self.parameter(FuelPressure), 1000.0)
            .add_u8(N2K_UINT8_NA)
            .add_u16(self.status_1())
            .add_u16(self.status_2())
            .add_i8(self.engine_load.get())
            .add_i8(self.engine_torque.get());
        payload.finish(PGN_ENGINE_PARAMETERS_DYNAMIC, PRIORITY_ENGINE_DYNAMIC)
    }
}

impl Configurable for EngineDynamic {
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

impl PeriodicEncoder<EngineDynamic> {
    /// Input for one numeric reading
    pub fn parameter_consumer(&self, parameter: EngineParameter) -> Rc<dyn Consumer<f64>> {
        let index = parameter.index();
        self.consumer(move |e: &mut EngineDynamic, v: f64| e.parameters[index].update(Some(v)))
    }

    /// Input for one alarm bit
    pub fn alarm_consumer(&self, alarm: EngineAlarm) -> Rc<dyn Consumer<bool>> {
        let index = alarm.index();
        self.consumer(move |e: &mut EngineDynamic, v: bool| e.alarms[index].update(v))
    }

    /// Engine load input, percent
    pub fn engine_load_consumer(&self) -> Rc<dyn Consumer<i8>> {
        self.consumer(|e: &mut EngineDynamic, v: i8| e.engine_load.update(Some(v)))
    }

    /// Engine torque input, percent
    pub fn engine_torque_consumer(&self) -> Rc<dyn Consumer<i8>> {
        self.consumer(|e: &mut EngineDynamic, v: i8| e.engine_torque.update(Some(v)))
    }
}
