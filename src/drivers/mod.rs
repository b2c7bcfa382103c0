//! Output drivers: the status LED and its blink engine.

pub mod led_patterns;
#[cfg(not(target_os = "espidf"))]
pub mod sim_pin;
pub mod status_led;
