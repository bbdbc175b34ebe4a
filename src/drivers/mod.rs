//! Relay driver and thread placement helpers.

pub mod relay;
pub mod task;

pub use relay::{RelayBank, SimulatedRelays};
