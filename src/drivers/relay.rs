//! Three-channel relay bank (light, heater, pump).
//!
//! ## Dual-target design
//!
//! [`RelayBank`] drives any three `embedded-hal` output pins, so the same
//! driver runs on ESP-IDF `PinDriver`s and on host mocks.
//! [`SimulatedRelays`] has no pins at all and only tracks levels; the
//! firmware falls back to it when GPIO initialisation fails.

use embedded_hal::digital::{OutputPin, PinState};
use log::info;

use crate::app::ports::ActuatorPort;
use crate::error::{ActuatorError, Relay};

/// Relay outputs over three GPIO pins.
pub struct RelayBank<L, H, P> {
    light: L,
    heater: H,
    pump: P,
    active_low: bool,
}

impl<L, H, P> RelayBank<L, H, P>
where
    L: OutputPin + Send,
    H: OutputPin + Send,
    P: OutputPin + Send,
{
    /// Take ownership of the pins and de-energise every relay.
    pub fn new(light: L, heater: H, pump: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut bank = Self {
            light,
            heater,
            pump,
            active_low,
        };
        bank.all_off()?;
        Ok(bank)
    }

    fn level(&self, on: bool) -> PinState {
        PinState::from(on != self.active_low)
    }

    /// Release the pins.
    pub fn into_pins(self) -> (L, H, P) {
        (self.light, self.heater, self.pump)
    }
}

impl<L, H, P> ActuatorPort for RelayBank<L, H, P>
where
    L: OutputPin + Send,
    H: OutputPin + Send,
    P: OutputPin + Send,
{
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = self.level(on);
        self.light
            .set_state(level)
            .map_err(|_| ActuatorError::GpioWriteFailed(Relay::Light))
    }

    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = self.level(on);
        self.heater
            .set_state(level)
            .map_err(|_| ActuatorError::GpioWriteFailed(Relay::Heater))
    }

    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = self.level(on);
        self.pump
            .set_state(level)
            .map_err(|_| ActuatorError::GpioWriteFailed(Relay::Pump))
    }
}

/// Pinless stand-in: logs and remembers every command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulatedRelays {
    pub light: bool,
    pub heater: bool,
    pub pump: bool,
}

impl SimulatedRelays {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActuatorPort for SimulatedRelays {
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        info!("[sim] light relay -> {}", if on { "ON" } else { "OFF" });
        self.light = on;
        Ok(())
    }

    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        info!("[sim] heater relay -> {}", if on { "ON" } else { "OFF" });
        self.heater = on;
        Ok(())
    }

    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        info!("[sim] pump relay -> {}", if on { "ON" } else { "OFF" });
        self.pump = on;
        Ok(())
    }
}
