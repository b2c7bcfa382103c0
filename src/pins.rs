//! GPIO pin assignments for the RangeLink node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a ping.
pub const ULTRASONIC_TRIG_GPIO: i32 = 5;
/// Digital input: HIGH for the echo round-trip time.
/// The sensor runs at 5 V; the line goes through a 1k/2k divider.
pub const ULTRASONIC_ECHO_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Built-in LED, active LOW on the reference board.
pub const STATUS_LED_GPIO: i32 = 2;
