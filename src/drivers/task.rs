//! Core-pinned thread spawning.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to a plain named thread.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers for the ESP32 Xtensa dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks (WiFi, lwIP).
    Pro = 0,
    /// Core 1 (APP_CPU): control loop and sensor timing.
    App = 1,
}

/// Placement of a spawned thread.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Null-terminated on ESP-IDF (e.g. `"control\0"`).
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// Control loop: owns the relays and bit-bangs the DHT22, so it runs
/// alone on the application core.
pub const CONTROL_TASK: TaskSpec = TaskSpec {
    name: "control\0",
    core: Core::App,
    priority: 5,
    stack_kb: 8,
};

/// Short-lived pump turn-off timer.
pub const PUMP_TIMER_TASK: TaskSpec = TaskSpec {
    name: "pump-timer\0",
    core: Core::Pro,
    priority: 4,
    stack_kb: 4,
};

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// On ESP-IDF, uses `esp_pthread_set_cfg()` to configure core affinity,
/// priority, and stack size before spawning.
#[cfg(feature = "espidf")]
pub fn spawn<F>(spec: TaskSpec, f: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = spec.priority as i32;
        cfg.stack_size = (spec.stack_kb * 1024) as i32;
        cfg.thread_name = spec.name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    let display_name = spec.name.trim_end_matches('\0');
    log::debug!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Host fallback: ignores core affinity and priority.
#[cfg(not(feature = "espidf"))]
pub fn spawn<F>(spec: TaskSpec, f: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let display_name = spec.name.trim_end_matches('\0');
    log::debug!(
        "Spawning '{}' (host, no core pinning, stack={}KB)",
        display_name,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
}
