//! Hardware adapter: binds ESP-IDF GPIO to the domain port traits.
//!
//! The only module that touches real peripherals.  Pins come from
//! [`crate::pins`]; the relay bank and the DHT22 decoder themselves are
//! HAL-agnostic and live in `drivers` and `sensors`.

use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, InputOutput, Output, PinDriver, Pull};

use crate::drivers::RelayBank;
use crate::error::{Error, Result};
use crate::pins;
use crate::sensors::{Dht22, MicroClock, SensorLine};

/// Open-drain data line of the DHT22.
pub type DataLine = PinDriver<'static, AnyIOPin, InputOutput>;
/// One relay channel.
pub type RelayPin = PinDriver<'static, AnyOutputPin, Output>;
pub type HardwareRelays = RelayBank<RelayPin, RelayPin, RelayPin>;
pub type HardwareSensor = Dht22<DataLine, EspMicroClock>;

// Open-drain: driving high releases the line to the pull-up.
impl SensorLine for DataLine {}

/// ROM busy-wait delays plus the high-resolution `esp_timer` counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct EspMicroClock;

impl DelayNs for EspMicroClock {
    fn delay_ns(&mut self, ns: u32) {
        Ets::delay_us(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        Ets::delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        Ets::delay_ms(ms);
    }
}

impl MicroClock for EspMicroClock {
    fn now_us(&mut self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64
    }
}

/// Configure the DHT22 data GPIO and build the decoder over it.
pub fn dht22() -> Result<HardwareSensor> {
    // SAFETY: the pin number comes from the board map and is claimed once.
    let pin = unsafe { AnyIOPin::new(pins::DHT22_DATA_GPIO) };
    let mut line = PinDriver::input_output_od(pin).map_err(|_| Error::Init("DHT22 data GPIO"))?;
    line.set_pull(Pull::Up).map_err(|_| Error::Init("DHT22 pull-up"))?;
    line.set_high().map_err(|_| Error::Init("DHT22 idle level"))?;
    Ok(Dht22::new(line, EspMicroClock))
}

/// Claim the three relay GPIOs; every relay starts de-energised.
pub fn relay_bank() -> Result<HardwareRelays> {
    fn output(gpio: i32, what: &'static str) -> Result<RelayPin> {
        // SAFETY: each relay GPIO is claimed exactly once, here.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        PinDriver::output(pin).map_err(|_| Error::Init(what))
    }

    let bank = RelayBank::new(
        output(pins::LIGHT_RELAY_GPIO, "light relay GPIO")?,
        output(pins::HEATER_RELAY_GPIO, "heater relay GPIO")?,
        output(pins::PUMP_RELAY_GPIO, "pump relay GPIO")?,
        pins::RELAYS_ACTIVE_LOW,
    )?;
    Ok(bank)
}
