//! GPIO assignments for the terrarium controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay outputs (opto-isolated relay module)
// ---------------------------------------------------------------------------

/// Light relay channel.
pub const LIGHT_RELAY_GPIO: i32 = 17;
/// Heater relay channel.
pub const HEATER_RELAY_GPIO: i32 = 27;
/// Misting pump relay channel.
pub const PUMP_RELAY_GPIO: i32 = 22;

/// Relay module polarity.  The fitted module energises on a HIGH input.
pub const RELAYS_ACTIVE_LOW: bool = false;

// ---------------------------------------------------------------------------
// DHT22 humidity / temperature sensor
// ---------------------------------------------------------------------------

/// Single-wire data line, open-drain with pull-up.
pub const DHT22_DATA_GPIO: i32 = 4;
