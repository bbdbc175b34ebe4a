//! Pin and clock primitives used by the single-wire decoder.
//!
//! The decoder needs three things from the platform: a bidirectional data
//! line, microsecond delays and a monotonic microsecond counter.  Both
//! traits build on `embedded-hal` 1.0 so any HAL pin works unchanged.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// A bidirectional open-drain data line.
///
/// `release` hands the line back to the external pull-up so the sensor
/// can drive it.  On an open-drain pin that is just "output high", which
/// is the default.
pub trait SensorLine: InputPin + OutputPin {
    fn release(&mut self) -> Result<(), Self::Error> {
        self.set_high()
    }
}

/// Microsecond delay source plus a monotonic microsecond counter.
pub trait MicroClock: DelayNs {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&mut self) -> u64;
}

// ---------------------------------------------------------------------------
// Host clock
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
pub use host::SpinClock;

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::time::{Duration, Instant};

    use embedded_hal::delay::DelayNs;

    use super::MicroClock;

    /// Delays below this busy-wait; longer ones yield to the scheduler.
    const SPIN_LIMIT: Duration = Duration::from_millis(1);

    /// `Instant`-backed clock for host builds.
    pub struct SpinClock {
        origin: Instant,
    }

    impl SpinClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for SpinClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DelayNs for SpinClock {
        fn delay_ns(&mut self, ns: u32) {
            let wait = Duration::from_nanos(u64::from(ns));
            if wait >= SPIN_LIMIT {
                std::thread::sleep(wait);
                return;
            }
            let deadline = Instant::now() + wait;
            while Instant::now() < deadline {
                core::hint::spin_loop();
            }
        }
    }

    impl MicroClock for SpinClock {
        fn now_us(&mut self) -> u64 {
            self.origin.elapsed().as_micros() as u64
        }
    }

}
