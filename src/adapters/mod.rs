//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements           | Connects to              |
//! |------------|----------------------|--------------------------|
//! | `hardware` | SensorLine           | ESP32 GPIO (DHT22)       |
//! |            | MicroClock           | esp_timer + ROM delays   |
//! |            | ActuatorPort (pins)  | ESP32 GPIO (relays)      |
//! | `log_sink` | EventSink            | Serial log output        |
//! | `time`     | TimePort             | System wall clock        |

#[cfg(feature = "espidf")]
pub mod hardware;
pub mod log_sink;
pub mod time;

pub use log_sink::LogEventSink;
pub use self::time::SystemClock;
