//! Command surface: JSON in, JSON out, against stores fed by a real
//! control loop.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use terrarium::app::TerrariumService;
use terrarium::control::Controller;
use terrarium::shutdown::ShutdownSignal;
use terrarium::store::{SettingsStore, StateStore};
use time::macros::datetime;

use crate::mock_hw::{ManualClock, MockRelays, MockSensor, RecordingSink, timeout};

type Service = TerrariumService<MockSensor, ManualClock>;

struct Fixture {
    state: Arc<StateStore>,
    settings: Arc<SettingsStore>,
    sensor: Arc<Mutex<MockSensor>>,
    clock: ManualClock,
}

impl Fixture {
    fn new(sensor: MockSensor) -> Self {
        Self {
            state: Arc::new(StateStore::new(datetime!(2024-06-01 12:00 UTC))),
            settings: Arc::new(SettingsStore::default()),
            sensor: Arc::new(Mutex::new(sensor)),
            clock: ManualClock::at(datetime!(2024-06-01 12:00 UTC)),
        }
    }

    fn service(&self) -> Service {
        TerrariumService::new(
            Arc::clone(&self.state),
            Arc::clone(&self.settings),
            Some(Arc::clone(&self.sensor)),
            self.clock.clone(),
        )
    }

    fn controller(&self) -> Controller<MockRelays, MockSensor, ManualClock, RecordingSink> {
        Controller::new(
            Arc::clone(&self.state),
            Arc::clone(&self.settings),
            Arc::new(Mutex::new(MockRelays::new())),
            Some(Arc::clone(&self.sensor)),
            self.clock.clone(),
            RecordingSink::new(),
            ShutdownSignal::new(),
        )
    }

    /// Run `n` control cycles on a fresh loop, one minute apart.
    fn cycles(&self, n: usize) {
        let mut c = self.controller();
        for _ in 0..n {
            c.run_cycle();
            self.clock.advance(60);
        }
    }
}

fn call(svc: &Service, cmd: Value) -> Value {
    svc.handle_json(&cmd.to_string())
}

// ── get_state / get_history ──────────────────────────────────

#[test]
fn get_state_reports_sensors_relays_and_system() {
    let f = Fixture::new(MockSensor::steady(22.5, 80.0));
    f.cycles(2);
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "get_state" }));
    assert_eq!(resp["status"], "success");
    let data = &resp["data"];
    assert_eq!(data["timestamp"], "2024-06-01T12:02:00Z");
    assert_eq!(data["sensors"]["temperature"], 22.5);
    assert_eq!(data["sensors"]["humidity"], 80.0);
    assert_eq!(data["sensors"]["last_read"], "2024-06-01T12:01:00Z");
    assert_eq!(data["sensors"]["sensor_error"], false);
    assert_eq!(data["relays"]["light"], true);
    assert_eq!(data["relays"]["heater"], true);
    assert_eq!(data["relays"]["pump"], false);
    assert_eq!(data["relays"]["last_pump_run"], Value::Null);
    assert_eq!(data["system"]["cycle_count"], 2);
    assert_eq!(data["system"]["uptime"], 120);
    assert_eq!(data["system"]["mode"], "auto");
    assert_eq!(data["system"]["error_streak"], 0);
}

#[test]
fn get_history_applies_limit() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    f.cycles(5);
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "get_history", "params": { "limit": 2 } }));
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["meta"], json!({ "count": 2, "total": 5, "limit": 2 }));
    let data = resp["data"].as_array().unwrap();
    assert_eq!(data[0]["timestamp"], "2024-06-01T12:03:00Z");
    assert_eq!(data[1]["timestamp"], "2024-06-01T12:04:00Z");
    assert_eq!(data[1]["humidity"], 75.0);

    let resp = call(&svc, json!({ "command": "get_history", "params": {} }));
    assert_eq!(resp["meta"]["limit"], 100);
    assert_eq!(resp["meta"]["count"], 5);

    let resp = call(&svc, json!({ "command": "get_history", "params": { "limit": 0 } }));
    assert_eq!(resp["meta"]["count"], 5);
}

// ── Settings ─────────────────────────────────────────────────

#[test]
fn update_settings_merges_partial_patch() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    let svc = f.service();

    let resp = call(
        &svc,
        json!({
            "command": "update_settings",
            "params": {
                "targets": { "humidity": 85.0 },
                "light_schedule": { "start_time": "07:30" },
                "pump_settings": { "duration_seconds": 20 },
            },
        }),
    );
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["data"]["targets"]["humidity"], 85.0);
    assert_eq!(resp["data"]["targets"]["temperature"], 26.0);
    assert_eq!(resp["data"]["light_schedule"]["start_time"], "07:30");
    assert_eq!(resp["data"]["light_schedule"]["end_time"], "20:00");
    assert_eq!(resp["data"]["pump"]["on_duration_seconds"], 20);
    assert_eq!(resp["data"]["pump"]["min_interval_seconds"], 300);

    let stored = f.settings.get_settings();
    assert!((stored.targets.humidity - 85.0).abs() < f32::EPSILON);
    assert_eq!(stored.pump.on_duration_seconds, 20);

    let resp = call(&svc, json!({ "command": "get_settings" }));
    assert_eq!(resp["data"]["targets"]["humidity"], 85.0);
}

#[test]
fn reset_settings_restores_defaults() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    f.settings.update_settings(|s| {
        s.cycle_pause_seconds = 5;
        s.use_simulated_sensor = true;
    });
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "reset_settings" }));
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["data"]["cycle_pause_seconds"], 30);
    assert_eq!(resp["data"]["use_simulated_sensor"], false);
    assert_eq!(f.settings.get_settings().cycle_pause_seconds, 30);
}

#[test]
fn simulation_can_be_toggled_and_set() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "toggle_simulation" }));
    assert_eq!(resp["data"]["use_simulated_sensor"], true);
    assert_eq!(resp["message"], "simulation mode: true");
    assert!(f.settings.get_settings().use_simulated_sensor);

    let resp = call(&svc, json!({ "command": "toggle_simulation" }));
    assert_eq!(resp["data"]["use_simulated_sensor"], false);

    let resp = call(
        &svc,
        json!({ "command": "set_simulation", "params": { "enabled": true } }),
    );
    assert_eq!(resp["status"], "success");
    assert!(f.settings.get_settings().use_simulated_sensor);
}

// ── Health ───────────────────────────────────────────────────

#[test]
fn health_tracks_the_operating_mode() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    let svc = f.service();
    let mut c = f.controller();
    let mut cycle = |n: usize| {
        for _ in 0..n {
            c.run_cycle();
            f.clock.advance(60);
        }
    };

    cycle(1);
    let resp = call(&svc, json!({ "command": "get_health" }));
    assert_eq!(resp["status"], "healthy");
    assert_eq!(resp["components"]["sensor"], "ok");
    assert_eq!(resp["cycle_count"], 1);
    assert_eq!(resp["uptime_seconds"], 60);
    assert_eq!(resp["version"], env!("CARGO_PKG_VERSION"));

    f.sensor.lock().unwrap().set_fallback(Err(timeout()));
    cycle(1);
    let resp = call(&svc, json!({ "command": "get_health" }));
    assert_eq!(resp["status"], "degraded");
    assert_eq!(resp["components"]["sensor"], "error");

    cycle(4);
    let resp = call(&svc, json!({ "command": "get_health" }));
    assert_eq!(resp["status"], "critical");
}

// ── test_sensor ──────────────────────────────────────────────

#[test]
fn test_sensor_reports_a_fresh_reading() {
    let f = Fixture::new(MockSensor::steady(23.4, 61.0));
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "test_sensor" }));
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["data"]["valid"], true);
    assert_eq!(resp["data"]["timestamp"], "2024-06-01T12:00:00Z");
    let t = resp["data"]["temperature"].as_f64().unwrap();
    assert!((t - 23.4).abs() < 1e-4);

    // The probe never touches the shared state.
    assert_eq!(f.state.get_state().cycle_count, 0);
    assert_eq!(f.state.get_history_count(), 0);
}

#[test]
fn test_sensor_failure_is_an_error_response() {
    let f = Fixture::new(MockSensor::dead());
    let svc = f.service();

    let resp = call(&svc, json!({ "command": "test_sensor" }));
    assert_eq!(resp["status"], "error");
    assert!(
        resp["message"]
            .as_str()
            .unwrap()
            .starts_with("sensor error: ")
    );
    // Probe uses the startup attempt budget.
    assert_eq!(f.sensor.lock().unwrap().reads, 3);
}

#[test]
fn test_sensor_without_decoder_is_an_error_response() {
    let f = Fixture::new(MockSensor::dead());
    let svc: Service = TerrariumService::new(
        Arc::clone(&f.state),
        Arc::clone(&f.settings),
        None,
        f.clock.clone(),
    );

    let resp = call(&svc, json!({ "command": "test_sensor" }));
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "sensor error: DHT22 sensor not initialised");
}

// ── Malformed input ──────────────────────────────────────────

#[test]
fn malformed_commands_are_rejected_without_side_effects() {
    let f = Fixture::new(MockSensor::steady(27.0, 75.0));
    let svc = f.service();

    for raw in [
        "not json",
        r#"{"command":"reboot"}"#,
        r#"{"command":"set_simulation","params":{"enabled":"yes"}}"#,
        r#"{"command":"update_settings","params":{"cycle_pause_seconds":-1}}"#,
    ] {
        let resp = svc.handle_json(raw);
        assert_eq!(resp["status"], "error", "accepted {raw}");
        assert!(
            resp["message"]
                .as_str()
                .unwrap()
                .starts_with("invalid request: ")
        );
    }
    assert_eq!(f.settings.get_settings(), terrarium::config::ControlSettings::default());
}
