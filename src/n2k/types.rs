//! # NMEA 2000 Category Enums
//!
//! Closed sets of named values used both in encoder configuration (as their
//! display strings) and on the wire (as their numeric codes).

use std::fmt;
use std::str::FromStr;

pub use crate::error::UnknownCategory;

/// Fluid type of a tank (PGN 127505)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FluidType {
    Fuel = 0,
    Water = 1,
    GrayWater = 2,
    LiveWell = 3,
    Oil = 4,
    BlackWater = 5,
}

impl FluidType {
    /// Every fluid type, in wire-code order
    pub const ALL: [FluidType; 6] = [
        FluidType::Fuel,
        FluidType::Water,
        FluidType::GrayWater,
        FluidType::LiveWell,
        FluidType::Oil,
        FluidType::BlackWater,
    ];

    /// Configuration string
    pub fn as_str(self) -> &'static str {
        match self {
            FluidType::Fuel => "Fuel",
            FluidType::Water => "Water",
            FluidType::GrayWater => "Gray water",
            FluidType::LiveWell => "Live well",
            FluidType::Oil => "Oil",
            FluidType::BlackWater => "Black water",
        }
    }

    /// 4-bit wire code
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl FromStr for FluidType {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for FluidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a temperature reading (PGN 130316)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TemperatureSource {
    Sea = 0,
    Outside = 1,
    Inside = 2,
    EngineRoom = 3,
    MainCabin = 4,
    LiveWell = 5,
    BaitWell = 6,
    Refrigeration = 7,
    HeatingSystem = 8,
    DewPoint = 9,
    ApparentWindChill = 10,
    TheoreticalWindChill = 11,
    HeatIndex = 12,
    Freezer = 13,
    ExhaustGas = 14,
    ShaftSeal = 15,
}

impl TemperatureSource {
    /// Every temperature source, in wire-code order
    pub const ALL: [TemperatureSource; 16] = [
        TemperatureSource::Sea,
        TemperatureSource::Outside,
        TemperatureSource::Inside,
        TemperatureSource::EngineRoom,
        TemperatureSource::MainCabin,
        TemperatureSource::LiveWell,
        TemperatureSource::BaitWell,
        TemperatureSource::Refrigeration,
        TemperatureSource::HeatingSystem,
        TemperatureSource::DewPoint,
        TemperatureSource::ApparentWindChill,
        TemperatureSource::TheoreticalWindChill,
        TemperatureSource::HeatIndex,
        TemperatureSource::Freezer,
        TemperatureSource::ExhaustGas,
        TemperatureSource::ShaftSeal,
    ];

    /// Configuration string
    pub fn as_str(self) -> &'static str {
        match self {
            TemperatureSource::Sea => "Sea Temperature",
            TemperatureSource::Outside => "Outside Temperature",
            TemperatureSource::Inside => "Inside Temperature",
            TemperatureSource::EngineRoom => "Engine Room Temperature",
            TemperatureSource::MainCabin => "Main Cabin Temperature",
            TemperatureSource::LiveWell => "Live Well Temperature",
            TemperatureSource::BaitWell => "Bait Well Temperature",
            TemperatureSource::Refrigeration => "Refrigeration Temperature",
            TemperatureSource::HeatingSystem => "Heating System Temperature",
            TemperatureSource::DewPoint => "Dew Point Temperature",
            TemperatureSource::ApparentWindChill => "Apparent Wind Chill Temperature",
            TemperatureSource::TheoreticalWindChill => "Theoretical Wind Chill Temperature",
            TemperatureSource::HeatIndex => "Heat Index Temperature",
            TemperatureSource::Freezer => "Freezer Temperature",
            TemperatureSource::ExhaustGas => "Exhaust Gas Temperature",
            TemperatureSource::ShaftSeal => "Shaft Seal Temperature",
        }
    }

    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl FromStr for TemperatureSource {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for TemperatureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
