//! Outbound application events.
//!
//! The [`Controller`](crate::control::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push to a web
//! socket, etc.

use crate::error::{ActuatorError, Relay, SensorError};
use crate::fsm::SystemMode;

/// Why the pump was switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStopReason {
    /// Humidity reached the target before the run ended.
    TargetReached,
    /// The scheduled run duration elapsed.
    TimerElapsed,
    /// The turn-off timer could not be armed.
    TimerUnavailable,
}

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control loop has started.
    Started,

    /// A relay was commanded to a new level.
    RelaySwitched {
        relay: Relay,
        on: bool,
        result: Result<(), ActuatorError>,
    },

    /// A pump run began; `duration_secs` is the scheduled length.
    PumpStarted { duration_secs: u64 },

    /// A pump run ended early.
    PumpStopped(PumpStopReason),

    /// Sensor acquisition failed this cycle.
    SensorFailed(SensorError),

    /// The operating mode changed.
    ModeChanged { from: SystemMode, to: SystemMode },

    /// End-of-cycle telemetry snapshot.
    Telemetry(TelemetryData),

    /// The control loop has stopped and every relay has been commanded off.
    Stopped,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub cycle: u64,
    pub mode: SystemMode,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub light_on: bool,
    pub heater_on: bool,
    pub pump_on: bool,
    pub sensor_error: bool,
    pub error_streak: u32,
}
