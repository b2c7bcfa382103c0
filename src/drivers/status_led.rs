//! Single-colour status LED driver.
//!
//! Generic over an `embedded-hal` output pin.  The reference board wires
//! the LED active-low, so the logical level is inverted before it reaches
//! the pin unless `active_low` is false.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::StatusLedPort;

pub struct StatusLed<P> {
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Wrap `pin` and drive the LED off.
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            active_low,
            on: true,
        };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        let high = on != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.on = on,
            Err(e) => warn!("status LED write failed: {:?}", e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<P: OutputPin> StatusLedPort for StatusLed<P> {
    fn set_led(&mut self, on: bool) {
        self.set(on);
    }
}
