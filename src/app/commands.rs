//! Inbound commands to the application service.
//!
//! These represent requests from the outside world (HTTP, serial console,
//! BLE) that the [`TerrariumService`](super::service::TerrariumService)
//! answers.  On the wire a command is
//! `{"command": "<name>", "params": {...}}`; `params` may be omitted for
//! commands that take none.

use serde::Deserialize;

use crate::config::SettingsPatch;

/// Default number of history records returned by `get_history`.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum AppCommand {
    /// Current readings, relay levels and loop counters.
    GetState,

    /// Most recent history records (all when `limit <= 0`).
    GetHistory {
        #[serde(default)]
        limit: Option<i64>,
    },

    GetSettings,

    /// Merge a partial settings update.
    UpdateSettings(SettingsPatch),

    /// Restore the factory settings.
    ResetSettings,

    /// Coarse health summary.
    GetHealth,

    /// Flip simulated-sensor mode.
    ToggleSimulation,

    /// Set simulated-sensor mode explicitly.
    SetSimulation { enabled: bool },

    /// One-off sensor read, independent of the control cycle.
    TestSensor,
}
