//! The 40-bit DHT22 payload and its validation.
//!
//! ```text
//!   byte 0   humidity, integer part
//!   byte 1   humidity, tenths
//!   byte 2   temperature, integer part (bit 7 = sign)
//!   byte 3   temperature, tenths
//!   byte 4   checksum = (b0 + b1 + b2 + b3) & 0xFF
//! ```

use serde::Serialize;

use crate::error::DecodeError;

pub const FRAME_BITS: u8 = 40;
pub const FRAME_BYTES: usize = 5;

const SIGN_BIT: u8 = 0x80;

pub const HUMIDITY_RANGE: core::ops::RangeInclusive<f32> = 0.0..=100.0;
pub const TEMPERATURE_RANGE: core::ops::RangeInclusive<f32> = -40.0..=80.0;

/// One validated humidity/temperature sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    /// °C.
    pub temperature: f32,
    /// Relative humidity, %.
    pub humidity: f32,
    pub valid: bool,
}

/// Raw frame as clocked off the wire, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame(pub [u8; FRAME_BYTES]);

impl Frame {
    /// Build a frame from four payload bytes with a correct checksum.
    pub fn with_checksum(payload: [u8; 4]) -> Self {
        let [a, b, c, d] = payload;
        Self([a, b, c, d, Self::checksum_of(&payload)])
    }

    pub fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    /// Low byte of the sum of the payload bytes.
    pub fn checksum_of(payload: &[u8; 4]) -> u8 {
        payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    pub fn is_valid_checksum(&self) -> bool {
        let [a, b, c, d, sum] = self.0;
        Self::checksum_of(&[a, b, c, d]) == sum
    }

    /// Validate the checksum, convert to physical units and range-check.
    pub fn decode(&self) -> Result<SensorReading, DecodeError> {
        let [h_int, h_frac, t_int, t_frac, received] = self.0;

        let expected = Self::checksum_of(&[h_int, h_frac, t_int, t_frac]);
        if expected != received {
            return Err(DecodeError::ChecksumMismatch { expected, received });
        }

        let humidity = f32::from(h_int) + f32::from(h_frac) / 10.0;
        let magnitude = f32::from(t_int & !SIGN_BIT) + f32::from(t_frac) / 10.0;
        let temperature = if t_int & SIGN_BIT != 0 {
            -magnitude
        } else {
            magnitude
        };

        if !HUMIDITY_RANGE.contains(&humidity) {
            return Err(DecodeError::HumidityOutOfRange(humidity));
        }
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(DecodeError::TemperatureOutOfRange(temperature));
        }

        Ok(SensorReading {
            temperature,
            humidity,
            valid: true,
        })
    }
}
