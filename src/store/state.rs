//! Operating state and history, shared between the control loop and any
//! number of readers.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use time::OffsetDateTime;

use crate::fsm::SystemMode;

use super::history::{HistoryRecord, HistoryRing};

/// Live view of the enclosure as last recorded by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingState {
    pub temperature: f32,
    pub humidity: f32,
    pub light_on: bool,
    pub heater_on: bool,
    pub pump_on: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sensor_read: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_pump_run: Option<OffsetDateTime>,
    pub cycle_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub mode: SystemMode,
    /// The most recent acquisition failed.
    pub sensor_error: bool,
    /// Consecutive faulted cycles.
    pub error_streak: u32,
}

impl OperatingState {
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            light_on: false,
            heater_on: false,
            pump_on: false,
            last_sensor_read: None,
            last_pump_run: None,
            cycle_count: 0,
            started_at,
            mode: SystemMode::Auto,
            sensor_error: false,
            error_streak: 0,
        }
    }

    pub fn uptime(&self, now: OffsetDateTime) -> time::Duration {
        now - self.started_at
    }
}

/// Owner of [`OperatingState`] and the history ring.
///
/// The two aggregates are locked independently; readers never block each
/// other and never see a half-applied mutation.
pub struct StateStore {
    state: RwLock<OperatingState>,
    history: RwLock<HistoryRing>,
}

impl StateStore {
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self {
            state: RwLock::new(OperatingState::new(started_at)),
            history: RwLock::new(HistoryRing::new()),
        }
    }

    pub fn get_state(&self) -> OperatingState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutator` under exclusive access.
    pub fn update_state<R>(&self, mutator: impl FnOnce(&mut OperatingState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        mutator(&mut state)
    }

    pub fn append_history(&self, record: HistoryRecord) {
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Owned copy of the most recent `limit` records, oldest first.
    /// `limit <= 0` returns everything.
    pub fn get_history(&self, limit: i64) -> Vec<HistoryRecord> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tail(limit)
    }

    pub fn get_history_count(&self) -> usize {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
