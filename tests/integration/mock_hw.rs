//! Mock hardware adapters for integration tests.
//!
//! Every mock is cheap to clone or share so a test can keep a handle
//! after moving the mock into a `Controller` (possibly on another
//! thread) and assert on what happened.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use terrarium::app::AppEvent;
use terrarium::app::ports::{ActuatorPort, EventSink, SensorPort, TimePort};
use terrarium::error::{ActuatorError, DecodeError, HandshakePhase, Relay, SensorError};
use terrarium::sensors::SensorReading;
use time::OffsetDateTime;

// ── MockRelays ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCall {
    pub relay: Relay,
    pub on: bool,
}

/// Records every relay command; writes to relays listed in `failing`
/// return `GpioWriteFailed` and leave the level unchanged.
#[derive(Debug, Default)]
pub struct MockRelays {
    pub calls: Vec<RelayCall>,
    pub failing: Vec<Relay>,
    pub light: bool,
    pub heater: bool,
    pub pump: bool,
}

#[allow(dead_code)]
impl MockRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(relays: &[Relay]) -> Self {
        Self {
            failing: relays.to_vec(),
            ..Self::default()
        }
    }

    pub fn count(&self, relay: Relay, on: bool) -> usize {
        self.calls
            .iter()
            .filter(|c| c.relay == relay && c.on == on)
            .count()
    }

    pub fn is_all_off(&self) -> bool {
        !self.light && !self.heater && !self.pump
    }

    fn drive(&mut self, relay: Relay, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(RelayCall { relay, on });
        if self.failing.contains(&relay) {
            return Err(ActuatorError::GpioWriteFailed(relay));
        }
        match relay {
            Relay::Light => self.light = on,
            Relay::Heater => self.heater = on,
            Relay::Pump => self.pump = on,
        }
        Ok(())
    }
}

impl ActuatorPort for MockRelays {
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.drive(Relay::Light, on)
    }

    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.drive(Relay::Heater, on)
    }

    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.drive(Relay::Pump, on)
    }
}

// ── MockSensor ────────────────────────────────────────────────

/// Replays scripted acquisitions, then repeats `fallback` forever.
#[derive(Debug)]
pub struct MockSensor {
    script: VecDeque<Result<SensorReading, SensorError>>,
    fallback: Result<SensorReading, SensorError>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn steady(temperature: f32, humidity: f32) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Ok(reading(temperature, humidity)),
            reads: 0,
        }
    }

    pub fn dead() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Err(timeout()),
            reads: 0,
        }
    }

    pub fn then(mut self, result: Result<SensorReading, SensorError>) -> Self {
        self.script.push_back(result);
        self
    }

    /// Replace what the sensor reports once the script runs out.
    pub fn set_fallback(&mut self, result: Result<SensorReading, SensorError>) {
        self.fallback = result;
    }
}

impl SensorPort for MockSensor {
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn read_with_retry(&mut self, max_attempts: u32) -> Result<SensorReading, SensorError> {
        let mut last = self.read();
        for _ in 1..max_attempts.max(1) {
            if last.is_ok() {
                break;
            }
            last = self.read();
        }
        last
    }
}

pub fn reading(temperature: f32, humidity: f32) -> SensorReading {
    SensorReading {
        temperature,
        humidity,
        valid: true,
    }
}

pub fn timeout() -> SensorError {
    DecodeError::HandshakeTimeout(HandshakePhase::ResponseLow).into()
}

// ── ManualClock ───────────────────────────────────────────────

/// Wall clock that only moves when a test advances it.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(t: OffsetDateTime) -> Self {
        Self(Arc::new(Mutex::new(t)))
    }

    pub fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += time::Duration::seconds(secs);
    }

    pub fn set(&self, t: OffsetDateTime) {
        *self.0.lock().unwrap() = t;
    }
}

impl TimePort for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<AppEvent>>>);

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}
