//! Operating-mode state machine.
//!
//! ```text
//!            fault (streak < threshold)
//!   ┌──────┐ ───────────────────────▶ ┌───────┐
//!   │ Auto │                          │ Error │──┐ fault
//!   └──────┘ ◀─────────────────────── └───────┘◀─┘
//!      ▲          clean cycle             │ fault (streak ≥ threshold)
//!      │                                  ▼
//!      │         clean cycle        ┌──────────┐
//!      └─────────────────────────── │ Critical │──┐ fault
//!                                   └──────────┘◀─┘
//! ```
//!
//! One transition per control cycle.  The streak counts faulted cycles,
//! not individual faults, and any clean cycle resets it.  There is no
//! terminal state.

use log::{error, info};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SystemMode {
    /// Last cycle completed without faults.
    Auto = 0,
    /// Last cycle faulted; streak below the threshold.
    Error = 1,
    /// Sustained failure: streak at or above the threshold.
    Critical = 2,
}

impl SystemMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl core::fmt::Display for SystemMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tracks the failure streak and derives the mode from it.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: SystemMode,
    streak: u32,
    threshold: u32,
}

impl ModeMachine {
    /// Start in `Auto` with a zero streak.  A threshold of 0 is treated
    /// as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            mode: SystemMode::Auto,
            streak: 0,
            threshold: threshold.max(1),
        }
    }

    /// Feed the outcome of one control cycle.
    ///
    /// Returns `Some((from, to))` when the mode changed.
    pub fn record_cycle(&mut self, faulted: bool) -> Option<(SystemMode, SystemMode)> {
        let next = if faulted {
            self.streak = self.streak.saturating_add(1);
            if self.streak >= self.threshold {
                SystemMode::Critical
            } else {
                SystemMode::Error
            }
        } else {
            self.streak = 0;
            SystemMode::Auto
        };

        if next == self.mode {
            return None;
        }
        let from = core::mem::replace(&mut self.mode, next);
        match next {
            SystemMode::Critical => error!(
                "Mode {from} -> critical after {} consecutive faulted cycles",
                self.streak
            ),
            _ => info!("Mode {from} -> {next}"),
        }
        Some((from, next))
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    /// Consecutive faulted cycles so far.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
