//! Per-cycle history records.

use std::collections::VecDeque;

use serde::Serialize;
use time::OffsetDateTime;

/// Ring capacity; the oldest record is evicted first.
pub const HISTORY_CAPACITY: usize = 1000;

/// Snapshot appended once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub temperature: f32,
    pub humidity: f32,
    pub light_on: bool,
    pub heater_on: bool,
    pub pump_on: bool,
    pub sensor_error: bool,
}

/// Bounded FIFO of [`HistoryRecord`]s, allocated once at full capacity.
/// Kept on the heap: a thousand records do not fit a task stack.
#[derive(Debug)]
pub(crate) struct HistoryRing {
    records: VecDeque<HistoryRecord>,
}

impl HistoryRing {
    pub(crate) fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub(crate) fn push(&mut self, record: HistoryRecord) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// The most recent `limit` records in insertion order.  A non-positive
    /// limit, or one above the stored count, returns everything.
    pub(crate) fn tail(&self, limit: i64) -> Vec<HistoryRecord> {
        let total = self.records.len();
        let take = usize::try_from(limit)
            .ok()
            .filter(|n| (1..=total).contains(n))
            .unwrap_or(total);
        self.records.range(total - take..).copied().collect()
    }
}
