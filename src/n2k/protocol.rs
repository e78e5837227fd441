//! # NMEA 2000 Protocol Constants and Types
//!
//! Parameter group numbers, priorities, "not available" markers and the
//! message value type handed to the transport.

use bytes::Bytes;

use crate::error::{N2kBridgeError, Result};

/// PGN 127488: Engine Parameters, Rapid Update
pub const PGN_ENGINE_PARAMETERS_RAPID: u32 = 127_488;

/// PGN 127489: Engine Parameters, Dynamic
pub const PGN_ENGINE_PARAMETERS_DYNAMIC: u32 = 127_489;

/// PGN 127505: Fluid Level
pub const PGN_FLUID_LEVEL: u32 = 127_505;

/// PGN 130316: Temperature, Extended Range
pub const PGN_TEMPERATURE_EXTENDED: u32 = 130_316;

/// Default priorities per PGN (0 = highest, 7 = lowest)
pub const PRIORITY_ENGINE_RAPID: u8 = 2;
pub const PRIORITY_ENGINE_DYNAMIC: u8 = 2;
pub const PRIORITY_FLUID_LEVEL: u8 = 6;
pub const PRIORITY_TEMPERATURE: u8 = 5;

/// Lowest valid priority value
pub const N2K_MAX_PRIORITY: u8 = 7;

/// Maximum payload of a fast-packet message
/// First frame carries 6 bytes, up to 31 follow-up frames carry 7 each: 6 + 31 × 7 = 223
pub const N2K_MAX_PAYLOAD_SIZE: usize = 223;

/// Payload sizes of the messages produced here
pub const ENGINE_RAPID_PAYLOAD_SIZE: usize = 8;
pub const ENGINE_DYNAMIC_PAYLOAD_SIZE: usize = 26;
pub const FLUID_LEVEL_PAYLOAD_SIZE: usize = 8;
pub const TEMPERATURE_EXTENDED_PAYLOAD_SIZE: usize = 8;

/// "Not available" markers
pub const N2K_UINT8_NA: u8 = 0xFF;
pub const N2K_INT8_NA: i8 = 0x7F;
pub const N2K_UINT16_NA: u16 = 0xFFFF;
pub const N2K_INT16_NA: i16 = 0x7FFF;
pub const N2K_UINT24_NA: u32 = 0x00FF_FFFF;
pub const N2K_UINT32_NA: u32 = 0xFFFF_FFFF;

/// "Out of range" markers (one below "not available")
pub const N2K_UINT16_OUT_OF_RANGE: u16 = 0xFFFE;
pub const N2K_INT16_OUT_OF_RANGE: i16 = 0x7FFE;
pub const N2K_UINT24_OUT_OF_RANGE: u32 = 0x00FF_FFFE;
pub const N2K_UINT32_OUT_OF_RANGE: u32 = 0xFFFF_FFFE;

/// Sequence ID used when messages are not correlated
pub const N2K_SID_UNUSED: u8 = 0xFF;

/// One logical NMEA 2000 message.
///
/// Messages are value objects built on every tick and dropped after the
/// transport has seen them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct N2kMessage {
    /// Parameter group number
    pub pgn: u32,

    /// Transmission priority (0-7)
    pub priority: u8,

    /// Packed little-endian payload
    pub payload: Bytes,
}

impl N2kMessage {
    /// Create a new message
    ///
    /// # Arguments
    ///
    /// * `pgn` - Parameter group number
    /// * `priority` - Priority (0-7)
    /// * `payload` - Payload data (max 223 bytes)
    ///
    /// # Errors
    ///
    /// Returns error if the priority exceeds 7 or the payload exceeds
    /// N2K_MAX_PAYLOAD_SIZE (223 bytes)
    pub fn new(pgn: u32, priority: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > N2K_MAX_PAYLOAD_SIZE {
            return Err(N2kBridgeError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                N2K_MAX_PAYLOAD_SIZE
            )));
        }
        if priority > N2K_MAX_PRIORITY {
            return Err(N2kBridgeError::Protocol(format!(
                "Priority {} exceeds maximum {}",
                priority, N2K_MAX_PRIORITY
            )));
        }

        Ok(Self { pgn, priority, payload })
    }

    /// Payload as space-separated hex bytes
    pub fn to_hex(&self) -> String {
        self.payload
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the payload needs the fast-packet transport (more than one CAN frame)
    pub fn is_fast_packet(&self) -> bool {
        self.payload.len() > 8
    }
}
