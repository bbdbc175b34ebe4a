//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the ESP-IDF logger in firmware, which goes to UART /
//! USB-CDC).  A future web socket adapter would implement the same trait.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | control loop running"),
            AppEvent::RelaySwitched { relay, on, result } => match result {
                Ok(()) => info!("RELAY | {} {}", relay, on_off(*on)),
                Err(e) => error!("RELAY | {} {} failed: {}", relay, on_off(*on), e),
            },
            AppEvent::PumpStarted { duration_secs } => {
                info!("PUMP  | ON for {}s", duration_secs);
            }
            AppEvent::PumpStopped(reason) => info!("PUMP  | OFF ({:?})", reason),
            AppEvent::SensorFailed(e) => warn!("SENSE | read failed: {}", e),
            AppEvent::ModeChanged { from, to } => info!("MODE  | {} -> {}", from, to),
            AppEvent::Telemetry(t) => {
                debug!(
                    "TELEM | cycle={} mode={} | T={:.1}\u{00b0}C H={:.1}% | \
                     light={} heater={} pump={} | sensor_err={} streak={}",
                    t.cycle,
                    t.mode,
                    t.temperature_c,
                    t.humidity_pct,
                    on_off(t.light_on),
                    on_off(t.heater_on),
                    on_off(t.pump_on),
                    t.sensor_error,
                    t.error_streak,
                );
            }
            AppEvent::Stopped => info!("STOP  | all relays off"),
        }
    }
}
