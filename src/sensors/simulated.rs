//! Synthetic readings for simulated mode.
//!
//! Temperature oscillates between roughly 22 and 28 °C in 0.1 °C steps;
//! humidity climbs 0.2 % per reading and drops back to 50 % above 80 %.
//! The sequence is deterministic so loop behaviour is reproducible.

use super::frame::SensorReading;

const TEMP_START: f32 = 25.0;
const TEMP_STEP: f32 = 0.1;
const TEMP_LOW: f32 = 22.0;
const TEMP_HIGH: f32 = 28.0;

const HUMIDITY_START: f32 = 65.0;
const HUMIDITY_STEP: f32 = 0.2;
const HUMIDITY_CEILING: f32 = 80.0;
const HUMIDITY_RESET: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    temperature: f32,
    direction: f32,
    humidity: f32,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            temperature: TEMP_START,
            direction: TEMP_STEP,
            humidity: HUMIDITY_START,
        }
    }

    /// Advance the walk by one step and return the new values.
    pub fn next_reading(&mut self) -> SensorReading {
        self.temperature += self.direction;
        if self.temperature > TEMP_HIGH || self.temperature < TEMP_LOW {
            self.direction = -self.direction;
        }

        self.humidity += HUMIDITY_STEP;
        if self.humidity > HUMIDITY_CEILING {
            self.humidity = HUMIDITY_RESET;
        }

        log::debug!(
            "simulated sensor: {:.1} °C, {:.1} %",
            self.temperature,
            self.humidity
        );
        SensorReading {
            temperature: self.temperature,
            humidity: self.humidity,
            valid: true,
        }
    }
}
