//! Terrarium Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayBank / SimulatedRelays   Dht22 (GPIO + esp_timer)        │
//! │  (ActuatorPort)                (SensorPort)                    │
//! │  LogEventSink (EventSink)      SystemClock (TimePort)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │ Controller (own thread)  │   │ TerrariumService         │   │
//! │  │ light · heater · pump    │   │ JSON commands on UART    │   │
//! │  └────────────┬─────────────┘   └─────────────┬────────────┘   │
//! │               └──── StateStore · SettingsStore ┘               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use terrarium::adapters::hardware::{self, HardwareSensor};
use terrarium::adapters::{LogEventSink, SystemClock};
use terrarium::app::TerrariumService;
use terrarium::app::ports::{ActuatorPort, TimePort};
use terrarium::config::{ControlSettings, ControlTuning};
use terrarium::control::Controller;
use terrarium::drivers::SimulatedRelays;
use terrarium::shutdown::ShutdownSignal;
use terrarium::store::{SettingsStore, StateStore};

/// Console line that stops the control loop and exits.
const SHUTDOWN_COMMAND: &str = "shutdown";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Terrarium v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let clock = SystemClock::new();
    let shutdown = ShutdownSignal::new();
    let tuning = ControlTuning::default();
    let state = Arc::new(StateStore::new(clock.now()));
    let settings = Arc::new(SettingsStore::new(ControlSettings::default()));

    // ── 2. Relays (fall back to simulation without GPIO) ──────
    let relays: Box<dyn ActuatorPort> = match hardware::relay_bank() {
        Ok(bank) => {
            info!("Relay GPIO initialised");
            Box::new(bank)
        }
        Err(e) => {
            warn!("Relay init failed ({e}), switching to simulated mode");
            settings.update_settings(|s| s.use_simulated_sensor = true);
            Box::new(SimulatedRelays::new())
        }
    };
    let relays = Arc::new(Mutex::new(relays));

    // ── 3. DHT22 + startup probe ──────────────────────────────
    let sensor: Option<Arc<Mutex<HardwareSensor>>> = match hardware::dht22() {
        Ok(dht) => {
            let mut dht = dht.with_shutdown(shutdown.clone());
            match dht.read_with_retry(tuning.probe_attempts) {
                Ok(r) => info!(
                    "DHT22 responding: {:.1} °C, {:.1} %",
                    r.temperature, r.humidity
                ),
                Err(e) => {
                    warn!("DHT22 not responding ({e}), switching to simulated mode");
                    settings.update_settings(|s| s.use_simulated_sensor = true);
                }
            }
            Some(Arc::new(Mutex::new(dht)))
        }
        Err(e) => {
            warn!("DHT22 init failed ({e}), switching to simulated mode");
            settings.update_settings(|s| s.use_simulated_sensor = true);
            None
        }
    };

    // ── 4. Control loop ───────────────────────────────────────
    let controller = Controller::new(
        Arc::clone(&state),
        Arc::clone(&settings),
        relays,
        sensor.clone(),
        clock,
        LogEventSink::new(),
        shutdown.clone(),
    )
    .with_tuning(tuning);
    let control = controller.spawn()?;

    info!(
        "Mode: {}",
        if settings.get_settings().use_simulated_sensor {
            "SIMULATED"
        } else {
            "DHT22"
        }
    );

    // ── 5. Command console ────────────────────────────────────
    let service = TerrariumService::new(state, settings, sensor, clock).with_tuning(tuning);
    info!("System ready. JSON commands accepted on the console.");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            // The console returns EOF while nothing is buffered.
            Ok(0) => std::thread::sleep(Duration::from_millis(100)),
            Ok(_) => {
                let cmd = line.trim();
                if cmd == SHUTDOWN_COMMAND {
                    break;
                }
                if !cmd.is_empty() {
                    println!("{}", service.handle_json(cmd));
                }
            }
            Err(e) => {
                warn!("Console read failed: {e}");
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }

    // ── 6. Shutdown ───────────────────────────────────────────
    info!("Shutdown requested");
    shutdown.trigger();
    if control.join().is_err() {
        error!("Control loop panicked");
    }
    info!("System stopped");
    Ok(())
}
