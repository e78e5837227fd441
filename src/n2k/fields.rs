//! # NMEA 2000 Field Packing
//!
//! Little-endian payload builder that scales physical values to their wire
//! resolution and substitutes the "not available" / "out of range" markers.
//!
//! Scaling is `round(value / resolution)`. `None` and non-finite values are
//! sent as "not available"; scaled values outside the valid range are sent as
//! "out of range".

use bytes::{BufMut, BytesMut};

use super::protocol::*;

/// Incrementally packs a message payload
#[derive(Debug)]
pub struct PayloadBuilder {
    buf: BytesMut,
}

impl PayloadBuilder {
    /// Create a builder with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Raw byte
    pub fn add_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    /// Raw 16-bit word
    pub fn add_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    /// Signed byte, 0x7F when not available
    pub fn add_i8(&mut self, value: Option<i8>) -> &mut Self {
        self.buf.put_i8(value.unwrap_or(N2K_INT8_NA));
        self
    }

    /// Unsigned 2-byte scaled value
    pub fn add_2byte_udouble(&mut self, value: Option<f64>, resolution: f64) -> &mut Self {
        let raw = scale(value, resolution, 0.0, f64::from(N2K_UINT16_OUT_OF_RANGE))
            .map(|r| r.map_or(N2K_UINT16_OUT_OF_RANGE, |v| v as u16))
            .unwrap_or(N2K_UINT16_NA);
        self.buf.put_u16_le(raw);
        self
    }

    /// Signed 2-byte scaled value
    pub fn add_2byte_double(&mut self, value: Option<f64>, resolution: f64) -> &mut Self {
        let raw = scale(
            value,
            resolution,
            f64::from(i16::MIN),
            f64::from(N2K_INT16_OUT_OF_RANGE),
        )
        .map(|r| r.map_or(N2K_INT16_OUT_OF_RANGE, |v| v as i16))
        .unwrap_or(N2K_INT16_NA);
        self.buf.put_i16_le(raw);
        self
    }

    /// Unsigned 3-byte scaled value
    pub fn add_3byte_udouble(&mut self, value: Option<f64>, resolution: f64) -> &mut Self {
        let raw = scale(value, resolution, 0.0, f64::from(N2K_UINT24_OUT_OF_RANGE))
            .map(|r| r.map_or(N2K_UINT24_OUT_OF_RANGE, |v| v as u32))
            .unwrap_or(N2K_UINT24_NA);
        self.buf.put_uint_le(u64::from(raw), 3);
        self
    }

    /// Unsigned 4-byte scaled value
    pub fn add_4byte_udouble(&mut self, value: Option<f64>, resolution: f64) -> &mut Self {
        let raw = scale(value, resolution, 0.0, f64::from(N2K_UINT32_OUT_OF_RANGE))
            .map(|r| r.map_or(N2K_UINT32_OUT_OF_RANGE, |v| v as u32))
            .unwrap_or(N2K_UINT32_NA);
        self.buf.put_u32_le(raw);
        self
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish into a message.
    ///
    /// The encoders in this crate produce fixed payloads of at most 26 bytes
    /// with the standard priorities, so no validation is repeated here.
    pub fn finish(self, pgn: u32, priority: u8) -> N2kMessage {
        debug_assert!(self.buf.len() <= N2K_MAX_PAYLOAD_SIZE);
        N2kMessage {
            pgn,
            priority,
            payload: self.buf.freeze(),
        }
    }
}

/// Scale a physical value to raw units.
///
/// Returns `None` for "not available", `Some(None)` for "out of range" and
/// `Some(Some(raw))` for a value within `[min, out_of_range)`.
fn scale(value: Option<f64>, resolution: f64, min: f64, out_of_range: f64) -> Option<Option<f64>> {
    let value = value.filter(|v| v.is_finite())?;
    let raw = (value / resolution).round();
    if raw >= min && raw < out_of_range {
        Some(Some(raw))
    } else {
        Some(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(f: impl FnOnce(&mut PayloadBuilder)) -> Vec<u8> {
        let mut builder = PayloadBuilder::with_capacity(8);
        f(&mut builder);
        builder.finish(0, 0).payload.to_vec()
    }

    #[test]
    fn test_2byte_udouble_scaling() {
        // 1500 rpm at 0.25 rpm/bit = 6000 = 0x1770
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(1500.0), 0.25); }), vec![0x70, 0x17]);
    }

    #[test]
    fn test_2byte_udouble_rounds() {
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(0.26), 0.1); }), vec![0x03, 0x00]);
    }

    #[test]
    fn test_2byte_udouble_not_available() {
        assert_eq!(bytes(|b| { b.add_2byte_udouble(None, 0.25); }), vec![0xFF, 0xFF]);
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(f64::NAN), 0.25); }), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_2byte_udouble_out_of_range() {
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(-1.0), 1.0); }), vec![0xFE, 0xFF]);
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(70000.0), 1.0); }), vec![0xFE, 0xFF]);
        // Largest valid raw value
        assert_eq!(bytes(|b| { b.add_2byte_udouble(Some(65533.0), 1.0); }), vec![0xFD, 0xFF]);
    }

    #[test]
    fn test_2byte_double_signed() {
        // -12.5 V at 0.01 V/bit = -1250 = 0xFB1E
        assert_eq!(bytes(|b| { b.add_2byte_double(Some(-12.5), 0.01); }), vec![0x1E, 0xFB]);
        assert_eq!(bytes(|b| { b.add_2byte_double(None, 0.01); }), vec![0xFF, 0x7F]);
        assert_eq!(bytes(|b| { b.add_2byte_double(Some(400.0), 0.01); }), vec![0xFE, 0x7F]);
    }

    #[test]
    fn test_3byte_udouble() {
        // 300.15 K at 0.001 K/bit = 300150 = 0x049476
        assert_eq!(bytes(|b| { b.add_3byte_udouble(Some(300.15), 0.001); }), vec![0x76, 0x94, 0x04]);
        assert_eq!(bytes(|b| { b.add_3byte_udouble(None, 0.001); }), vec![0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_4byte_udouble() {
        assert_eq!(bytes(|b| { b.add_4byte_udouble(Some(3600.0), 1.0); }), vec![0x10, 0x0E, 0x00, 0x00]);
        assert_eq!(bytes(|b| { b.add_4byte_udouble(None, 1.0); }), vec![0xFF; 4]);
    }

    #[test]
    fn test_i8_and_raw_words() {
        assert_eq!(bytes(|b| { b.add_i8(Some(-5)); }), vec![0xFB]);
        assert_eq!(bytes(|b| { b.add_i8(None); }), vec![0x7F]);
        assert_eq!(bytes(|b| { b.add_u16(0x0108); }), vec![0x08, 0x01]);
    }

    #[test]
    fn test_builder_len() {
        let mut builder = PayloadBuilder::with_capacity(8);
        assert!(builder.is_empty());
        builder.add_u8(1).add_u16(2).add_i8(None);
        assert_eq!(builder.len(), 4);
    }
}
