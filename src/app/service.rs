//! Application service: the transport-facing command surface.
//!
//! [`TerrariumService`] answers [`AppCommand`]s against the shared stores
//! and renders every response as a JSON value.  It holds no state of its
//! own, so any number of transport threads can share one instance.
//!
//! ```text
//!  transport ──▶ ┌──────────────────┐ ──▶ StateStore / SettingsStore
//!  (HTTP, UART)  │ TerrariumService │
//!                └──────────────────┘ ──▶ SensorPort (test_sensor only)
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::ControlTuning;
use crate::error::{Error, SensorError};
use crate::fsm::SystemMode;
use crate::store::{SettingsStore, StateStore};

use super::commands::{AppCommand, DEFAULT_HISTORY_LIMIT};
use super::ports::{SensorPort, TimePort};

/// Firmware version reported by `get_health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ───────────────────────────────────────────────────────────────
// Health
// ───────────────────────────────────────────────────────────────

/// Overall health derived from the operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Warning,
    Degraded,
    Critical,
}

impl Health {
    pub fn assess(mode: SystemMode, sensor_error: bool) -> Self {
        match mode {
            SystemMode::Critical => Self::Critical,
            SystemMode::Error => Self::Degraded,
            SystemMode::Auto if sensor_error => Self::Warning,
            SystemMode::Auto => Self::Healthy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// TerrariumService
// ───────────────────────────────────────────────────────────────

pub struct TerrariumService<S: SensorPort, T: TimePort> {
    state: Arc<StateStore>,
    settings: Arc<SettingsStore>,
    sensor: Option<Arc<Mutex<S>>>,
    clock: T,
    tuning: ControlTuning,
}

impl<S: SensorPort, T: TimePort> TerrariumService<S, T> {
    pub fn new(
        state: Arc<StateStore>,
        settings: Arc<SettingsStore>,
        sensor: Option<Arc<Mutex<S>>>,
        clock: T,
    ) -> Self {
        Self {
            state,
            settings,
            sensor,
            clock,
            tuning: ControlTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: ControlTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Parse a raw JSON command and answer it.  Malformed input yields an
    /// error response rather than a failure.
    pub fn handle_json(&self, raw: &str) -> Value {
        match serde_json::from_str::<AppCommand>(raw) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                let err = Error::InvalidRequest(e.to_string());
                warn!("Rejected command: {err}");
                error_response(&err.to_string())
            }
        }
    }

    pub fn handle(&self, cmd: AppCommand) -> Value {
        match cmd {
            AppCommand::GetState => self.get_state(),
            AppCommand::GetHistory { limit } => {
                self.get_history(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            }
            AppCommand::GetSettings => json!({
                "status": "success",
                "data": self.settings.get_settings(),
            }),
            AppCommand::UpdateSettings(patch) => {
                let settings = self.settings.apply_settings_patch(&patch);
                info!("Settings updated");
                json!({
                    "status": "success",
                    "message": "settings updated",
                    "data": settings,
                })
            }
            AppCommand::ResetSettings => {
                let settings = self.settings.reset_settings();
                info!("Settings reset to defaults");
                json!({
                    "status": "success",
                    "message": "settings reset to defaults",
                    "data": settings,
                })
            }
            AppCommand::GetHealth => self.get_health(),
            AppCommand::ToggleSimulation => {
                let enabled = self.settings.update_settings(|s| {
                    s.use_simulated_sensor = !s.use_simulated_sensor;
                    s.use_simulated_sensor
                });
                simulation_response(enabled)
            }
            AppCommand::SetSimulation { enabled } => {
                self.settings
                    .update_settings(|s| s.use_simulated_sensor = enabled);
                simulation_response(enabled)
            }
            AppCommand::TestSensor => self.test_sensor(),
        }
    }

    fn get_state(&self) -> Value {
        let s = self.state.get_state();
        let now = self.clock.now();
        json!({
            "status": "success",
            "data": {
                "timestamp": rfc3339(now),
                "sensors": {
                    "temperature": s.temperature,
                    "humidity": s.humidity,
                    "last_read": s.last_sensor_read.map_or(Value::Null, rfc3339),
                    "sensor_error": s.sensor_error,
                },
                "relays": {
                    "light": s.light_on,
                    "heater": s.heater_on,
                    "pump": s.pump_on,
                    "last_pump_run": s.last_pump_run.map_or(Value::Null, rfc3339),
                },
                "system": {
                    "cycle_count": s.cycle_count,
                    "uptime": s.uptime(now).whole_seconds().max(0),
                    "mode": s.mode,
                    "error_streak": s.error_streak,
                },
            },
        })
    }

    fn get_history(&self, limit: i64) -> Value {
        let records = self.state.get_history(limit);
        json!({
            "status": "success",
            "meta": {
                "count": records.len(),
                "total": self.state.get_history_count(),
                "limit": limit,
            },
            "data": records,
        })
    }

    fn get_health(&self) -> Value {
        let s = self.state.get_state();
        let now = self.clock.now();
        let health = Health::assess(s.mode, s.sensor_error);
        json!({
            "status": health.as_str(),
            "components": {
                "sensor": if s.sensor_error { "error" } else { "ok" },
                "relays": "ok",
                "control_loop": "running",
            },
            "uptime_seconds": s.uptime(now).whole_seconds().max(0),
            "cycle_count": s.cycle_count,
            "version": VERSION,
            "timestamp": rfc3339(now),
        })
    }

    fn test_sensor(&self) -> Value {
        let result = match &self.sensor {
            None => Err(SensorError::Unavailable),
            Some(sensor) => sensor
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .read_with_retry(self.tuning.probe_attempts),
        };
        match result {
            Ok(r) => json!({
                "status": "success",
                "data": {
                    "temperature": r.temperature,
                    "humidity": r.humidity,
                    "valid": r.valid,
                    "timestamp": rfc3339(self.clock.now()),
                },
            }),
            Err(e) => {
                warn!("Sensor test failed: {e}");
                error_response(&format!("sensor error: {e}"))
            }
        }
    }
}

fn simulation_response(enabled: bool) -> Value {
    info!("Simulated sensor {}", if enabled { "enabled" } else { "disabled" });
    json!({
        "status": "success",
        "message": format!("simulation mode: {enabled}"),
        "data": { "use_simulated_sensor": enabled },
    })
}

fn error_response(message: &str) -> Value {
    json!({ "status": "error", "message": message })
}

fn rfc3339(t: OffsetDateTime) -> Value {
    t.format(&Rfc3339).map_or(Value::Null, Value::String)
}
