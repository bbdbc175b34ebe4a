//! Humidity/temperature acquisition.
//!
//! [`dht22`] bit-bangs the single-wire protocol over the primitives in
//! [`timing`]; [`frame`] validates the 40-bit payload; [`simulated`]
//! stands in when no hardware is attached.

pub mod dht22;
pub mod frame;
pub mod simulated;
pub mod timing;

pub use dht22::Dht22;
pub use frame::{Frame, SensorReading};
pub use simulated::SimulatedSensor;
pub use timing::{MicroClock, SensorLine};
