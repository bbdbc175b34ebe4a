//! Unified error types for the terrarium controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command surface's error handling uniform.  The control loop itself never
//! propagates these upward: sensor and relay faults are logged, counted in
//! the failure streak and reflected in the operating mode.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The humidity/temperature sensor could not produce a reading.
    Sensor(SensorError),
    /// A relay write failed.
    Actuator(ActuatorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// A command or settings payload could not be understood.
    InvalidRequest(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decoder errors
// ---------------------------------------------------------------------------

/// Handshake step that timed out before the first data bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Sensor never pulled the line low after the start signal.
    ResponseLow,
    /// Sensor never released the line after its low response.
    ResponseHigh,
}

/// Edge that timed out while sampling a data bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitPhase {
    /// Waiting for the low preamble that opens a bit slot.
    SlotStart,
    /// Waiting for the rising edge that starts the timed high pulse.
    Rising,
}

/// Failures of a single-wire frame acquisition.
///
/// Every variant is recoverable by retrying after the sensor's cooldown.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The data line could not be driven while sending the start signal.
    Line,
    /// No response from the sensor within the handshake window.
    HandshakeTimeout(HandshakePhase),
    /// The sensor stopped clocking bits mid-frame.
    BitTimeout { bit: u8, phase: BitPhase },
    /// Byte 4 does not match the low byte of the sum of bytes 0..=3.
    ChecksumMismatch { expected: u8, received: u8 },
    /// Decoded humidity outside 0–100 %.
    HumidityOutOfRange(f32),
    /// Decoded temperature outside -40–80 °C.
    TemperatureOutOfRange(f32),
    /// Every attempt of a retried read failed; `last` is the final cause.
    Exhausted { attempts: u32, last: Box<DecodeError> },
}

impl DecodeError {
    /// True for handshake and bit-sampling timeouts.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::HandshakeTimeout(_) | Self::BitTimeout { .. } => true,
            Self::Exhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    /// The innermost cause, unwrapping retry exhaustion.
    pub fn root(&self) -> &DecodeError {
        match self {
            Self::Exhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "data line write failed"),
            Self::HandshakeTimeout(HandshakePhase::ResponseLow) => {
                write!(f, "sensor response timeout (low)")
            }
            Self::HandshakeTimeout(HandshakePhase::ResponseHigh) => {
                write!(f, "sensor response timeout (high)")
            }
            Self::BitTimeout { bit, phase } => match phase {
                BitPhase::SlotStart => write!(f, "timeout waiting for start of bit {bit}"),
                BitPhase::Rising => write!(f, "timeout waiting for high of bit {bit}"),
            },
            Self::ChecksumMismatch { expected, received } => write!(
                f,
                "checksum mismatch (expected 0x{expected:02x}, received 0x{received:02x})"
            ),
            Self::HumidityOutOfRange(h) => write!(f, "humidity out of range: {h:.1}"),
            Self::TemperatureOutOfRange(t) => write!(f, "temperature out of range: {t:.1}"),
            Self::Exhausted { attempts, last } => {
                write!(f, "failed after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Sensor acquisition errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Hardware mode selected but no decoder is attached.
    Unavailable,
    /// The decoder failed.
    Decode(DecodeError),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "DHT22 sensor not initialised"),
            Self::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<DecodeError> for SensorError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Sensor(SensorError::Decode(e))
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// The three relay channels of the enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relay {
    Light,
    Heater,
    Pump,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Heater => write!(f, "heater"),
            Self::Pump => write!(f, "pump"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed on the given relay channel.
    GpioWriteFailed(Relay),
}

impl ActuatorError {
    pub fn relay(self) -> Relay {
        match self {
            Self::GpioWriteFailed(relay) => relay,
        }
    }
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(relay) => write!(f, "{relay} relay GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
