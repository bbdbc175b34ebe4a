//! Application core: ports, events and the command surface.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping the control loop and [`service`] fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

pub use commands::AppCommand;
pub use events::AppEvent;
pub use service::TerrariumService;
