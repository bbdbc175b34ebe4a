//! Control loop against mock relays, a scripted sensor and a manual clock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use terrarium::app::AppEvent;
use terrarium::app::events::PumpStopReason;
use terrarium::app::ports::TimePort;
use terrarium::control::Controller;
use terrarium::error::{ActuatorError, Relay};
use terrarium::fsm::SystemMode;
use terrarium::shutdown::ShutdownSignal;
use terrarium::store::{HISTORY_CAPACITY, SettingsStore, StateStore};
use time::macros::datetime;

use crate::mock_hw::{ManualClock, MockRelays, MockSensor, RecordingSink, reading, timeout};

type Rig = Controller<MockRelays, MockSensor, ManualClock, RecordingSink>;

struct Harness {
    state: Arc<StateStore>,
    settings: Arc<SettingsStore>,
    relays: Arc<Mutex<MockRelays>>,
    sensor: Arc<Mutex<MockSensor>>,
    clock: ManualClock,
    sink: RecordingSink,
    shutdown: ShutdownSignal,
}

impl Harness {
    fn new(relays: MockRelays, sensor: MockSensor) -> Self {
        let clock = ManualClock::at(datetime!(2024-06-01 12:00 UTC));
        Self {
            state: Arc::new(StateStore::new(datetime!(2024-06-01 12:00 UTC))),
            settings: Arc::new(SettingsStore::default()),
            relays: Arc::new(Mutex::new(relays)),
            sensor: Arc::new(Mutex::new(sensor)),
            clock,
            sink: RecordingSink::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    fn controller(&self) -> Rig {
        Controller::new(
            Arc::clone(&self.state),
            Arc::clone(&self.settings),
            Arc::clone(&self.relays),
            Some(Arc::clone(&self.sensor)),
            self.clock.clone(),
            self.sink.clone(),
            self.shutdown.clone(),
        )
    }

    fn pump_starts(&self) -> usize {
        self.relays.lock().unwrap().count(Relay::Pump, true)
    }
}

fn wait_until(deadline: Duration, cond: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// ── Operating modes ──────────────────────────────────────────

#[test]
fn five_faulted_cycles_escalate_to_critical_and_one_clean_cycle_recovers() {
    let h = Harness::new(MockRelays::new(), MockSensor::dead());
    let mut c = h.controller();

    let modes: Vec<_> = (0..5).map(|_| c.run_cycle().mode).collect();
    assert_eq!(
        modes,
        [
            SystemMode::Error,
            SystemMode::Error,
            SystemMode::Error,
            SystemMode::Error,
            SystemMode::Critical
        ]
    );
    assert_eq!(h.state.get_state().error_streak, 5);

    h.sensor
        .lock()
        .unwrap()
        .set_fallback(Ok(reading(27.0, 75.0)));
    let report = c.run_cycle();
    assert!(!report.faulted());
    assert_eq!(report.mode, SystemMode::Auto);
    assert_eq!(report.error_streak, 0);

    let s = h.state.get_state();
    assert_eq!(s.mode, SystemMode::Auto);
    assert!(!s.sensor_error);

    let transitions: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        [
            (SystemMode::Auto, SystemMode::Error),
            (SystemMode::Error, SystemMode::Critical),
            (SystemMode::Critical, SystemMode::Auto),
        ]
    );
}

#[test]
fn sensor_retries_within_a_cycle_mask_a_single_glitch() {
    let sensor = MockSensor::steady(24.0, 75.0).then(Err(timeout()));
    let h = Harness::new(MockRelays::new(), sensor);
    let mut c = h.controller();

    let report = c.run_cycle();
    assert!(!report.faulted());
    assert_eq!(h.sensor.lock().unwrap().reads, 2);
    assert!(h.state.get_state().last_sensor_read.is_some());
}

// ── Relays ───────────────────────────────────────────────────

#[test]
fn failed_relay_write_records_desired_state_and_faults_the_cycle() {
    let h = Harness::new(
        MockRelays::failing(&[Relay::Heater]),
        MockSensor::steady(20.0, 75.0),
    );
    let mut c = h.controller();

    let report = c.run_cycle();
    assert!(report.faulted());
    assert_eq!(
        report.relay_errors.as_slice(),
        [ActuatorError::GpioWriteFailed(Relay::Heater)]
    );
    assert_eq!(report.mode, SystemMode::Error);
    assert!(h.state.get_state().heater_on);
    assert!(!h.relays.lock().unwrap().heater);

    // Desired state is unchanged, so the write is not retried.
    let report = c.run_cycle();
    assert!(report.relay_errors.is_empty());
    assert_eq!(report.mode, SystemMode::Auto);
    assert_eq!(h.relays.lock().unwrap().count(Relay::Heater, true), 1);
}

#[test]
fn light_follows_the_schedule() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 75.0));
    let mut c = h.controller();

    h.clock.set(datetime!(2024-06-01 07:59 UTC));
    c.run_cycle();
    assert!(!h.state.get_state().light_on);

    h.clock.set(datetime!(2024-06-01 08:00 UTC));
    c.run_cycle();
    assert!(h.state.get_state().light_on);
    assert!(h.relays.lock().unwrap().light);

    h.clock.set(datetime!(2024-06-01 20:01 UTC));
    c.run_cycle();
    assert!(!h.state.get_state().light_on);
    assert_eq!(h.relays.lock().unwrap().count(Relay::Light, true), 1);
    assert_eq!(h.relays.lock().unwrap().count(Relay::Light, false), 1);
}

// ── Pump ─────────────────────────────────────────────────────

#[test]
fn pump_stops_when_humidity_reaches_target() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 60.0));
    let mut c = h.controller();

    c.run_cycle();
    assert!(h.state.get_state().pump_on);
    assert!(h.relays.lock().unwrap().pump);

    h.sensor
        .lock()
        .unwrap()
        .set_fallback(Ok(reading(27.0, 71.0)));
    h.clock.advance(5);
    c.run_cycle();

    assert!(!h.state.get_state().pump_on);
    assert!(!h.relays.lock().unwrap().pump);
    assert_eq!(h.relays.lock().unwrap().count(Relay::Pump, false), 1);
    assert_eq!(
        h.sink.count(|e| *e == AppEvent::PumpStopped(PumpStopReason::TargetReached)),
        1
    );
}

#[test]
fn pump_rests_for_the_minimum_interval() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 60.0));
    let mut c = h.controller();
    let started = h.clock.now();

    c.run_cycle();
    assert_eq!(h.pump_starts(), 1);
    assert_eq!(h.state.get_state().last_pump_run, Some(started));

    // Target reached: pump off before its timer.
    h.sensor
        .lock()
        .unwrap()
        .set_fallback(Ok(reading(27.0, 72.0)));
    h.clock.advance(30);
    c.run_cycle();
    assert!(!h.state.get_state().pump_on);

    // Dry again, but still resting.
    h.sensor
        .lock()
        .unwrap()
        .set_fallback(Ok(reading(27.0, 60.0)));
    for secs in [60, 200, 300] {
        h.clock.set(started + time::Duration::seconds(secs));
        c.run_cycle();
        assert_eq!(h.pump_starts(), 1, "re-activated at T+{secs}s");
    }

    h.clock.set(started + time::Duration::seconds(301));
    c.run_cycle();
    assert_eq!(h.pump_starts(), 2);
}

#[test]
fn pump_timer_switches_the_pump_off_exactly_once() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 60.0));
    h.settings.update_settings(|s| s.pump.on_duration_seconds = 0);
    let mut c = h.controller();

    c.run_cycle();
    let state = Arc::clone(&h.state);
    assert!(
        wait_until(Duration::from_secs(2), || !state.get_state().pump_on),
        "timer never fired"
    );
    assert!(!h.relays.lock().unwrap().pump);

    // Next cycle reaps the fired timer without touching the relay again.
    h.clock.advance(30);
    c.run_cycle();
    assert_eq!(h.relays.lock().unwrap().count(Relay::Pump, false), 1);
    assert_eq!(
        h.sink.count(|e| *e == AppEvent::PumpStopped(PumpStopReason::TimerElapsed)),
        1
    );
    assert_eq!(h.pump_starts(), 1);
}

// ── History ──────────────────────────────────────────────────

#[test]
fn history_keeps_the_most_recent_records() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 75.0));
    let mut c = h.controller();

    let cycles = HISTORY_CAPACITY + 5;
    for _ in 0..cycles {
        c.run_cycle();
        h.clock.advance(1);
    }

    assert_eq!(h.state.get_state().cycle_count, cycles as u64);
    assert_eq!(h.state.get_history_count(), HISTORY_CAPACITY);

    let all = h.state.get_history(0);
    let first = datetime!(2024-06-01 12:00 UTC);
    assert_eq!(all[0].timestamp, first + time::Duration::seconds(5));
    assert_eq!(
        all[HISTORY_CAPACITY - 1].timestamp,
        first + time::Duration::seconds(cycles as i64 - 1)
    );

    let last = h.state.get_history(3);
    assert_eq!(last.len(), 3);
    assert_eq!(last[2], all[HISTORY_CAPACITY - 1]);
}

// ── Lifecycle ────────────────────────────────────────────────

#[test]
fn shutdown_during_pause_exits_promptly_with_relays_off() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(20.0, 60.0));
    h.settings.update_settings(|s| s.cycle_pause_seconds = 3600);
    let handle = h.controller().spawn().expect("spawn control loop");

    let state = Arc::clone(&h.state);
    assert!(wait_until(Duration::from_secs(2), || {
        state.get_state().cycle_count >= 1
    }));
    {
        let relays = h.relays.lock().unwrap();
        assert!(relays.light && relays.heater && relays.pump);
    }

    let stopping = Instant::now();
    h.shutdown.trigger();
    handle.join().expect("control loop panicked");
    assert!(stopping.elapsed() < Duration::from_secs(2));

    assert!(h.relays.lock().unwrap().is_all_off());
    let s = h.state.get_state();
    assert!(!s.light_on && !s.heater_on && !s.pump_on);
    assert_eq!(s.cycle_count, 1);

    let events = h.sink.events();
    assert_eq!(events.first(), Some(&AppEvent::Started));
    assert_eq!(events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn missing_sensor_in_hardware_mode_faults_every_cycle() {
    let h = Harness::new(MockRelays::new(), MockSensor::steady(27.0, 75.0));
    let mut c: Rig = Controller::new(
        Arc::clone(&h.state),
        Arc::clone(&h.settings),
        Arc::clone(&h.relays),
        None,
        h.clock.clone(),
        h.sink.clone(),
        h.shutdown.clone(),
    );
    for _ in 0..3 {
        assert!(c.run_cycle().faulted());
    }
    assert!(h.state.get_state().sensor_error);
    assert_eq!(h.state.get_state().error_streak, 3);

    // Switching to the simulated sensor clears the fault.
    h.settings.update_settings(|s| s.use_simulated_sensor = true);
    assert!(!c.run_cycle().faulted());
}
