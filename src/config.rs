//! Control settings and loop tuning.
//!
//! [`ControlSettings`] holds every operator-tunable parameter of the
//! enclosure.  Values are not range-checked: a target of 100 °C simply
//! keeps the heater on.  [`SettingsPatch`] carries partial updates from
//! the command surface.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// A wall-clock time of day at minute resolution, written as `HH:MM`.
///
/// Hours and minutes are stored as given; `25:70` is accepted and simply
/// never matches a real clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub hour: u8,
    pub minute: u8,
}

impl ScheduleTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ScheduleTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got {s:?}"))?;
        let hour = h.parse().map_err(|_| format!("invalid hour in {s:?}"))?;
        let minute = m.parse().map_err(|_| format!("invalid minute in {s:?}"))?;
        Ok(Self { hour, minute })
    }
}

impl Serialize for ScheduleTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScheduleTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Settings groups
// ---------------------------------------------------------------------------

/// Daily light window.  When `end_time` is earlier than `start_time` the
/// window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSchedule {
    pub start_time: ScheduleTime,
    pub end_time: ScheduleTime,
    pub enabled: bool,
}

impl LightSchedule {
    /// Whether the light should be on at `now` (both window ends inclusive).
    pub fn is_on_at(&self, now: time::Time) -> bool {
        if !self.enabled {
            return false;
        }
        let current = now.hour() as u16 * 60 + now.minute() as u16;
        let start = self.start_time.minutes();
        let end = self.end_time.minutes();

        if start > end {
            current >= start || current <= end
        } else {
            current >= start && current <= end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    /// Heater runs while the enclosure is colder than this (°C).
    pub temperature: f32,
    /// Pump runs while the enclosure is drier than this (%).
    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpPolicy {
    /// How long one pump activation lasts.
    pub on_duration_seconds: u64,
    /// Minimum time between two activations.
    pub min_interval_seconds: u64,
}

// ---------------------------------------------------------------------------
// ControlSettings
// ---------------------------------------------------------------------------

/// Operator-tunable settings, read by the control loop every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    pub light_schedule: LightSchedule,
    pub targets: Targets,
    pub pump: PumpPolicy,
    /// Pause between control cycles in seconds (doubled while faulted).
    pub cycle_pause_seconds: u64,
    /// Generate synthetic readings instead of talking to the DHT22.
    pub use_simulated_sensor: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            light_schedule: LightSchedule {
                start_time: ScheduleTime::new(8, 0),
                end_time: ScheduleTime::new(20, 0),
                enabled: true,
            },
            targets: Targets {
                temperature: 26.0,
                humidity: 70.0,
            },
            pump: PumpPolicy {
                on_duration_seconds: 10,
                min_interval_seconds: 300,
            },
            cycle_pause_seconds: 30,
            use_simulated_sensor: false,
        }
    }
}

impl ControlSettings {
    /// Overwrite only the fields present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(light) = &patch.light_schedule {
            if let Some(start) = light.start_time {
                self.light_schedule.start_time = start;
            }
            if let Some(end) = light.end_time {
                self.light_schedule.end_time = end;
            }
            if let Some(enabled) = light.enabled {
                self.light_schedule.enabled = enabled;
            }
        }
        if let Some(targets) = &patch.targets {
            if let Some(t) = targets.temperature {
                self.targets.temperature = t;
            }
            if let Some(h) = targets.humidity {
                self.targets.humidity = h;
            }
        }
        if let Some(pump) = &patch.pump {
            if let Some(d) = pump.on_duration_seconds {
                self.pump.on_duration_seconds = d;
            }
            if let Some(i) = pump.min_interval_seconds {
                self.pump.min_interval_seconds = i;
            }
        }
        if let Some(pause) = patch.cycle_pause_seconds {
            self.cycle_pause_seconds = pause;
        }
        if let Some(sim) = patch.use_simulated_sensor {
            self.use_simulated_sensor = sim;
        }
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// A partial settings update.  Absent fields are left untouched and
/// unknown fields are ignored.  The legacy field names of the web UI are
/// accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_schedule: Option<LightSchedulePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<TargetsPatch>,
    #[serde(alias = "pump_settings", skip_serializing_if = "Option::is_none")]
    pub pump: Option<PumpPolicyPatch>,
    #[serde(alias = "cycle_pause", skip_serializing_if = "Option::is_none")]
    pub cycle_pause_seconds: Option<u64>,
    #[serde(alias = "use_mock_data", skip_serializing_if = "Option::is_none")]
    pub use_simulated_sensor: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSchedulePatch {
    pub start_time: Option<ScheduleTime>,
    pub end_time: Option<ScheduleTime>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsPatch {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpPolicyPatch {
    #[serde(alias = "duration_seconds")]
    pub on_duration_seconds: Option<u64>,
    #[serde(alias = "min_interval")]
    pub min_interval_seconds: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loop tuning (not operator-writable)
// ---------------------------------------------------------------------------

/// Fixed parameters of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTuning {
    /// Consecutive faulted cycles before the mode escalates to critical.
    pub fault_threshold: u32,
    /// Decoder attempts per control cycle.
    pub sensor_attempts: u32,
    /// Decoder attempts for an operator-triggered sensor test.
    pub probe_attempts: u32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            fault_threshold: 5,
            sensor_attempts: 2,
            probe_attempts: 3,
        }
    }
}
