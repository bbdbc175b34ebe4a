//! Terrarium controller library.
//!
//! Exposes the pure-logic modules for integration testing and the
//! firmware binary. All ESP-IDF-specific code is guarded by the `espidf`
//! feature within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod sensors;
pub mod shutdown;
pub mod store;

pub use error::{Error, Result};
