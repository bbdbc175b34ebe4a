//! Shared stores: operating state with its history ring, and settings.
//!
//! Every access goes through a get (owned copy) or a mutator closure run
//! under the write lock, so no reference into the store ever escapes.
//! Poisoned locks are recovered: the data is plain values and is
//! consistent whenever a mutator has returned.

pub mod history;
pub mod settings;
pub mod state;

pub use history::{HISTORY_CAPACITY, HistoryRecord};
pub use settings::SettingsStore;
pub use state::{OperatingState, StateStore};
