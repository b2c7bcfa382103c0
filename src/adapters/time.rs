//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side runs and tests.
//!
//! Millisecond readings drive the state machine timers; microsecond
//! readings time the ultrasonic echo pulse.

use crate::sensors::ultrasonic::MicrosClock;

#[derive(Clone, Copy)]
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot (monotonic).
    pub fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

impl MicrosClock for MonotonicClock {
    fn now_us(&self) -> u64 {
        self.uptime_us()
    }
}
