//! # NMEA 2000 Protocol Module
//!
//! Logical message layer for the NMEA 2000 PGNs this bridge transmits.
//!
//! This module handles:
//! - PGN numbers, priorities and payload sizes
//! - "Not available" / "out of range" markers
//! - Scaled little-endian field packing
//! - Fluid type and temperature source tables
//!
//! CAN framing, fast-packet segmentation and address claiming belong to the
//! transport, not to this module.

pub mod fields;
pub mod protocol;
pub mod types;

pub use protocol::N2kMessage;
pub use types::{FluidType, TemperatureSource};
