//! Fuzz target: `Frame::decode`
//!
//! Drives arbitrary 5-byte frames through checksum validation and unit
//! conversion and asserts that it never panics and that every accepted
//! reading lies inside the physical sanity bounds.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use terrarium::sensors::Frame;
use terrarium::sensors::frame::{HUMIDITY_RANGE, TEMPERATURE_RANGE};

fuzz_target!(|data: &[u8]| {
    let Ok(bytes) = <[u8; 5]>::try_from(data.get(..5).unwrap_or_default()) else {
        return;
    };
    let frame = Frame(bytes);

    if let Ok(reading) = frame.decode() {
        assert!(frame.is_valid_checksum(), "accepted a bad checksum");
        assert!(HUMIDITY_RANGE.contains(&reading.humidity));
        assert!(TEMPERATURE_RANGE.contains(&reading.temperature));
        assert!(reading.valid);
    }
});
