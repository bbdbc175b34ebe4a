//! The control loop.
//!
//! Every cycle re-reads the settings and walks the same fixed sequence:
//!
//! ```text
//!   light schedule ─▶ sensor ─▶ heater ─▶ pump ─▶ bookkeeping ─▶ pause
//! ```
//!
//! Relay and sensor faults never abort a cycle.  They are logged, mark
//! the cycle as faulted and feed the [`ModeMachine`].  The recorded relay
//! state is the *desired* state: it is updated even when the GPIO write
//! fails, so the next cycle does not retry the write until the desired
//! state changes again.

pub mod pump_timer;

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info};
use time::OffsetDateTime;

use crate::app::events::{AppEvent, PumpStopReason, TelemetryData};
use crate::app::ports::{ActuatorPort, EventSink, SensorPort, TimePort};
use crate::config::{ControlSettings, ControlTuning};
use crate::drivers::task::{self, CONTROL_TASK};
use crate::error::{ActuatorError, Relay, SensorError};
use crate::fsm::{ModeMachine, SystemMode};
use crate::sensors::{SensorReading, SimulatedSensor};
use crate::shutdown::ShutdownSignal;
use crate::store::{HistoryRecord, SettingsStore, StateStore};

pub use pump_timer::PumpTimer;

/// Relay writes per cycle: light, heater, pump on and the pump's
/// fallback off.
pub const MAX_RELAY_ERRORS: usize = 4;

pub type RelayErrors = heapless::Vec<ActuatorError, MAX_RELAY_ERRORS>;

/// Outcome of one control cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub reading: Result<SensorReading, SensorError>,
    pub relay_errors: RelayErrors,
    pub mode: SystemMode,
    pub error_streak: u32,
}

impl CycleReport {
    pub fn faulted(&self) -> bool {
        self.reading.is_err() || !self.relay_errors.is_empty()
    }
}

/// Owns the decision logic and drives relays through the ports.
pub struct Controller<R, S, T, E>
where
    R: ActuatorPort + 'static,
    S: SensorPort + 'static,
{
    state: Arc<StateStore>,
    settings: Arc<SettingsStore>,
    relays: Arc<Mutex<R>>,
    sensor: Option<Arc<Mutex<S>>>,
    simulated: SimulatedSensor,
    clock: T,
    sink: E,
    modes: ModeMachine,
    pump_timer: PumpTimer<R>,
    tuning: ControlTuning,
    shutdown: ShutdownSignal,
}

impl<R, S, T, E> Controller<R, S, T, E>
where
    R: ActuatorPort + 'static,
    S: SensorPort + 'static,
    T: TimePort,
    E: EventSink,
{
    pub fn new(
        state: Arc<StateStore>,
        settings: Arc<SettingsStore>,
        relays: Arc<Mutex<R>>,
        sensor: Option<Arc<Mutex<S>>>,
        clock: T,
        sink: E,
        shutdown: ShutdownSignal,
    ) -> Self {
        let tuning = ControlTuning::default();
        let pump_timer = PumpTimer::new(Arc::clone(&relays), Arc::clone(&state), shutdown.clone());
        Self {
            state,
            settings,
            relays,
            sensor,
            simulated: SimulatedSensor::new(),
            clock,
            sink,
            modes: ModeMachine::new(tuning.fault_threshold),
            pump_timer,
            tuning,
            shutdown,
        }
    }

    pub fn with_tuning(mut self, tuning: ControlTuning) -> Self {
        self.modes = ModeMachine::new(tuning.fault_threshold);
        self.tuning = tuning;
        self
    }

    /// Run cycles until the shutdown signal fires, then switch every relay
    /// off.
    pub fn run(mut self) {
        let started = self.clock.now();
        self.state.update_state(|s| {
            s.started_at = started;
            s.mode = SystemMode::Auto;
        });
        info!("Control loop started");
        self.sink.emit(&AppEvent::Started);

        while !self.shutdown.is_triggered() {
            self.run_cycle();
            let pause = self.pause(&self.settings.get_settings());
            debug!("Next cycle in {}s", pause.as_secs());
            if self.shutdown.sleep(pause) {
                break;
            }
        }

        self.stop();
    }

    /// Execute one full cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        let settings = self.settings.get_settings();
        let now = self.clock.now();
        let mut relay_errors = RelayErrors::new();

        if self.pump_timer.reap() {
            self.sink
                .emit(&AppEvent::PumpStopped(PumpStopReason::TimerElapsed));
        }

        // Light
        let light = settings.light_schedule.is_on_at(now.time());
        if light != self.state.get_state().light_on {
            self.switch(Relay::Light, light, &mut relay_errors);
        }

        // Sensor
        let reading = self.acquire(&settings);
        let (temperature, humidity) = match &reading {
            Ok(r) => (r.temperature, r.humidity),
            Err(e) => {
                self.sink.emit(&AppEvent::SensorFailed(e.clone()));
                let last = self.state.get_state();
                (last.temperature, last.humidity)
            }
        };

        // Heater
        let heater = temperature < settings.targets.temperature;
        if heater != self.state.get_state().heater_on {
            self.switch(Relay::Heater, heater, &mut relay_errors);
        }

        // Pump
        self.drive_pump(&settings, humidity, now, &mut relay_errors);

        // Bookkeeping
        let faulted = reading.is_err() || !relay_errors.is_empty();
        let change = self.modes.record_cycle(faulted);
        let (mode, streak) = (self.modes.mode(), self.modes.streak());
        let sensor_ok = reading.is_ok();
        let snapshot = self.state.update_state(|s| {
            s.temperature = temperature;
            s.humidity = humidity;
            s.sensor_error = !sensor_ok;
            if sensor_ok {
                s.last_sensor_read = Some(now);
            }
            s.cycle_count += 1;
            s.mode = mode;
            s.error_streak = streak;
            *s
        });
        self.state.append_history(HistoryRecord {
            timestamp: now,
            temperature,
            humidity,
            light_on: snapshot.light_on,
            heater_on: snapshot.heater_on,
            pump_on: snapshot.pump_on,
            sensor_error: snapshot.sensor_error,
        });

        if let Some((from, to)) = change {
            self.sink.emit(&AppEvent::ModeChanged { from, to });
        }
        self.sink.emit(&AppEvent::Telemetry(TelemetryData {
            cycle: snapshot.cycle_count,
            mode,
            temperature_c: temperature,
            humidity_pct: humidity,
            light_on: snapshot.light_on,
            heater_on: snapshot.heater_on,
            pump_on: snapshot.pump_on,
            sensor_error: snapshot.sensor_error,
            error_streak: streak,
        }));

        CycleReport {
            cycle: snapshot.cycle_count,
            reading,
            relay_errors,
            mode,
            error_streak: streak,
        }
    }

    /// Spawn [`run`](Self::run) on the control task.
    pub fn spawn(self) -> io::Result<JoinHandle<()>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        task::spawn(CONTROL_TASK, move || self.run())
    }

    /// Pause before the next cycle, doubled while any fault is unresolved.
    fn pause(&self, settings: &ControlSettings) -> Duration {
        let secs = if self.modes.streak() > 0 {
            settings.cycle_pause_seconds.saturating_mul(2)
        } else {
            settings.cycle_pause_seconds
        };
        Duration::from_secs(secs)
    }

    fn acquire(&mut self, settings: &ControlSettings) -> Result<SensorReading, SensorError> {
        if settings.use_simulated_sensor {
            return Ok(self.simulated.next_reading());
        }
        let sensor = self.sensor.as_ref().ok_or(SensorError::Unavailable)?;
        sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_with_retry(self.tuning.sensor_attempts)
    }

    fn drive_pump(
        &mut self,
        settings: &ControlSettings,
        humidity: f32,
        now: OffsetDateTime,
        relay_errors: &mut RelayErrors,
    ) {
        let current = self.state.get_state();
        let target = settings.targets.humidity;

        if current.pump_on {
            if humidity < target {
                return;
            }
            // Only the side that stops the timer drives the relay.
            let reason = if self.pump_timer.cancel() {
                let result = self.with_relays(|r| r.set_pump(false));
                self.report(Relay::Pump, false, result, relay_errors);
                PumpStopReason::TargetReached
            } else {
                PumpStopReason::TimerElapsed
            };
            self.state.update_state(|s| s.pump_on = false);
            self.sink.emit(&AppEvent::PumpStopped(reason));
            return;
        }

        let min_interval = time::Duration::seconds(
            i64::try_from(settings.pump.min_interval_seconds).unwrap_or(i64::MAX),
        );
        let rested = current
            .last_pump_run
            .is_none_or(|last| now - last > min_interval);
        if humidity >= target || !rested {
            return;
        }

        let result = self.with_relays(|r| r.set_pump(true));
        self.report(Relay::Pump, true, result, relay_errors);
        self.state.update_state(|s| {
            s.pump_on = true;
            s.last_pump_run = Some(now);
        });

        let duration = settings.pump.on_duration_seconds;
        match self.pump_timer.arm(Duration::from_secs(duration)) {
            Ok(()) => {
                info!("Pump on for {duration}s (H={humidity:.1} < {target:.1})");
                self.sink.emit(&AppEvent::PumpStarted {
                    duration_secs: duration,
                });
            }
            Err(e) => {
                error!("Pump timer unavailable ({e}), switching pump off");
                let result = self.with_relays(|r| r.set_pump(false));
                self.report(Relay::Pump, false, result, relay_errors);
                self.state.update_state(|s| s.pump_on = false);
                self.sink
                    .emit(&AppEvent::PumpStopped(PumpStopReason::TimerUnavailable));
            }
        }
    }

    /// Drive `relay` and record the desired level regardless of outcome.
    fn switch(&mut self, relay: Relay, on: bool, relay_errors: &mut RelayErrors) {
        let result = self.with_relays(|r| match relay {
            Relay::Light => r.set_light(on),
            Relay::Heater => r.set_heater(on),
            Relay::Pump => r.set_pump(on),
        });
        self.report(relay, on, result, relay_errors);
        self.state.update_state(|s| match relay {
            Relay::Light => s.light_on = on,
            Relay::Heater => s.heater_on = on,
            Relay::Pump => s.pump_on = on,
        });
    }

    fn report(
        &mut self,
        relay: Relay,
        on: bool,
        result: Result<(), ActuatorError>,
        relay_errors: &mut RelayErrors,
    ) {
        if let Err(e) = result {
            let _ = relay_errors.push(e);
        }
        self.sink
            .emit(&AppEvent::RelaySwitched { relay, on, result });
    }

    fn with_relays<X>(&self, f: impl FnOnce(&mut R) -> X) -> X {
        let mut relays = self.relays.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut relays)
    }

    fn stop(&mut self) {
        self.pump_timer.cancel();
        if let Err(e) = self.with_relays(|r| r.all_off()) {
            error!("Relay shutdown incomplete: {e}");
        }
        self.state.update_state(|s| {
            s.light_on = false;
            s.heater_on = false;
            s.pump_on = false;
        });
        info!("Control loop stopped");
        self.sink.emit(&AppEvent::Stopped);
    }
}
