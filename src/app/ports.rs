//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller / TerrariumService (domain)
//! ```
//!
//! Driven adapters (relays, the DHT22, the wall clock, event sinks)
//! implement these traits.  The domain consumes them via generics, so the
//! control logic never touches hardware directly and runs unchanged
//! against the mocks in `tests/integration/mock_hw.rs`.

use time::OffsetDateTime;

use crate::error::{ActuatorError, SensorError};
use crate::sensors::SensorReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Humidity/temperature acquisition.
pub trait SensorPort: Send {
    /// One acquisition attempt.
    fn read(&mut self) -> Result<SensorReading, SensorError>;

    /// Up to `max_attempts` acquisitions (at least one) with the sensor's
    /// cooldown in between.
    fn read_with_retry(&mut self, max_attempts: u32) -> Result<SensorReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Relay outputs.  Setting a relay to its current level is a no-op on the
/// hardware and must succeed.
pub trait ActuatorPort: Send {
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// De-energise every relay.  All three are attempted even if one
    /// fails; the first failure is returned.
    fn all_off(&mut self) -> Result<(), ActuatorError> {
        let light = self.set_light(false);
        let heater = self.set_heater(false);
        let pump = self.set_pump(false);
        light.and(heater).and(pump)
    }
}

impl<A: ActuatorPort + ?Sized> ActuatorPort for Box<A> {
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        (**self).set_light(on)
    }

    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        (**self).set_heater(on)
    }

    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        (**self).set_pump(on)
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        (**self).all_off()
    }
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  The light schedule uses the local time of day of
/// the returned instant.
pub trait TimePort {
    fn now(&self) -> OffsetDateTime;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// a web socket, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
