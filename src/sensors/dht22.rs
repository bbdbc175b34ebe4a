//! DHT22 single-wire humidity/temperature sensor.
//!
//! One acquisition is a host start signal followed by a sensor response
//! and 40 data bits.  Each bit is a ~50 µs low preamble and a high pulse
//! whose width carries the value (~26 µs = 0, ~70 µs = 1):
//!
//! ```text
//!  host      sensor response     bit 0 (=0)       bit 1 (=1)
//!  ▔▔╲____╱▔╲_______╱▔▔▔▔▔▔▔╲_____╱▔▔╲_____╱▔▔▔▔▔▔╲ ...
//!     18ms  40µs  80µs    80µs    50µs 26µs  50µs   70µs
//! ```
//!
//! The decoder only polls the line against a [`MicroClock`], so it runs
//! unchanged against a fake clock and a scripted waveform in tests.

use std::time::Duration;

use crate::app::ports::SensorPort;
use crate::error::{BitPhase, DecodeError, HandshakePhase, SensorError};
use crate::shutdown::ShutdownSignal;

use super::frame::{FRAME_BITS, FRAME_BYTES, Frame, SensorReading};
use super::timing::{MicroClock, SensorLine};

/// Host start signal: low for at least 18 ms …
const START_LOW_MS: u32 = 18;
/// … then high for 40 µs before releasing the line.
const START_HIGH_US: u32 = 40;
/// Limit for each half of the sensor response.
const RESPONSE_TIMEOUT_US: u64 = 100;
/// Limit for each edge inside a bit slot.
const BIT_TIMEOUT_US: u64 = 100;
/// A high pulse is never measured beyond this.
const BIT_HIGH_CAP_US: u64 = 100;
/// High pulses strictly longer than this are a 1.
const ONE_THRESHOLD_US: u64 = 50;

/// Minimum spacing between two acquisitions.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Bit-banged DHT22 decoder over any [`SensorLine`] and [`MicroClock`].
pub struct Dht22<P, C> {
    pin: P,
    clock: C,
    cooldown: Duration,
    shutdown: ShutdownSignal,
}

impl<P: SensorLine, C: MicroClock> Dht22<P, C> {
    pub fn new(pin: P, clock: C) -> Self {
        Self {
            pin,
            clock,
            cooldown: DEFAULT_COOLDOWN,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Override the pause between retried acquisitions.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Abort retry cooldowns when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// One acquisition: handshake, 40 bits, checksum and range validation.
    pub fn read(&mut self) -> Result<SensorReading, DecodeError> {
        self.send_start()?;
        let frame = self.read_frame()?;
        let reading = frame.decode()?;
        log::debug!(
            "DHT22: {:.1} °C, {:.1} % ({:02x?})",
            reading.temperature,
            reading.humidity,
            frame.bytes()
        );
        Ok(reading)
    }

    /// Up to `max_attempts` acquisitions (at least one), pausing the
    /// cooldown between them.  A shutdown during the cooldown ends the
    /// sequence early.
    pub fn read_with_retry(&mut self, max_attempts: u32) -> Result<SensorReading, DecodeError> {
        let budget = max_attempts.max(1);
        let mut attempt = 1;
        let last = loop {
            match self.read() {
                Ok(reading) => return Ok(reading),
                Err(e) if attempt >= budget => break e,
                Err(e) => {
                    log::warn!("DHT22 attempt {attempt}/{budget} failed: {e}");
                    if self.shutdown.sleep(self.cooldown) {
                        break e;
                    }
                    attempt += 1;
                }
            }
        };
        Err(DecodeError::Exhausted {
            attempts: attempt,
            last: Box::new(last),
        })
    }

    fn send_start(&mut self) -> Result<(), DecodeError> {
        self.pin.set_low().map_err(|_| DecodeError::Line)?;
        self.clock.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| DecodeError::Line)?;
        self.clock.delay_us(START_HIGH_US);
        self.pin.release().map_err(|_| DecodeError::Line)
    }

    fn read_frame(&mut self) -> Result<Frame, DecodeError> {
        if !self.wait_for(false, RESPONSE_TIMEOUT_US)? {
            return Err(DecodeError::HandshakeTimeout(HandshakePhase::ResponseLow));
        }
        if !self.wait_for(true, RESPONSE_TIMEOUT_US)? {
            return Err(DecodeError::HandshakeTimeout(HandshakePhase::ResponseHigh));
        }

        let mut bytes = [0u8; FRAME_BYTES];
        for bit in 0..FRAME_BITS {
            let value = u8::from(self.read_bit(bit)?);
            bytes[usize::from(bit / 8)] |= value << (7 - bit % 8);
        }
        Ok(Frame(bytes))
    }

    fn read_bit(&mut self, bit: u8) -> Result<bool, DecodeError> {
        if !self.wait_for(false, BIT_TIMEOUT_US)? {
            return Err(DecodeError::BitTimeout {
                bit,
                phase: BitPhase::SlotStart,
            });
        }
        if !self.wait_for(true, BIT_TIMEOUT_US)? {
            return Err(DecodeError::BitTimeout {
                bit,
                phase: BitPhase::Rising,
            });
        }

        let rose = self.clock.now_us();
        while self.is_high()? {
            if self.clock.now_us().saturating_sub(rose) >= BIT_HIGH_CAP_US {
                break;
            }
        }
        let width = self.clock.now_us().saturating_sub(rose);
        Ok(width > ONE_THRESHOLD_US)
    }

    /// Poll until the line reads `high`.  `Ok(false)` on timeout.
    fn wait_for(&mut self, high: bool, timeout_us: u64) -> Result<bool, DecodeError> {
        let start = self.clock.now_us();
        loop {
            if self.is_high()? == high {
                return Ok(true);
            }
            if self.clock.now_us().saturating_sub(start) >= timeout_us {
                return Ok(false);
            }
        }
    }

    fn is_high(&mut self) -> Result<bool, DecodeError> {
        self.pin.is_high().map_err(|_| DecodeError::Line)
    }
}

impl<P, C> SensorPort for Dht22<P, C>
where
    P: SensorLine + Send,
    C: MicroClock + Send,
{
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        Dht22::read(self).map_err(SensorError::from)
    }

    fn read_with_retry(&mut self, max_attempts: u32) -> Result<SensorReading, SensorError> {
        Dht22::read_with_retry(self, max_attempts).map_err(SensorError::from)
    }
}
