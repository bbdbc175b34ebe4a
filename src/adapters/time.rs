//! Wall-clock adapter.
//!
//! The light schedule works in local time of day.  The local UTC offset is
//! captured once at construction: querying it later is unsound on
//! multi-threaded hosts, and the firmware's TZ never changes at runtime.
//!
//! On ESP-IDF the system clock reads 1970 until SNTP has synced; the
//! schedule then evaluates against that placeholder date's time of day.

use time::{OffsetDateTime, UtcOffset};

use crate::app::ports::TimePort;

/// [`TimePort`] backed by the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Capture the local offset, falling back to UTC when it cannot be
    /// determined.
    pub fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            log::warn!("local UTC offset unavailable ({e}), using UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl TimePort for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}
