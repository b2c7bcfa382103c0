//! HC-SR04 ultrasonic ranger driver.
//!
//! A 10 µs HIGH pulse on TRIG makes the module emit a 40 kHz burst; ECHO
//! then stays HIGH for the round-trip time of flight.  Both waits on ECHO
//! are bounded by `echo_timeout_us`, so a missing target costs at most two
//! timeouts of busy-waiting.
//!
//! ## Dual-target design
//!
//! The driver is generic over `embedded-hal` 1.0 pins and delay plus a
//! [`MicrosClock`].  On ESP-IDF those are `PinDriver`s, `Ets` and the
//! high-resolution timer; tests drive it with scripted mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use super::RangeReading;
use crate::app::ports::RangeSensorPort;
use crate::error::SensorError;

/// Speed of sound at ~20 °C in centimetres per microsecond.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// TRIG held LOW before the pulse so the module sees a clean edge.
const SETTLE_US: u32 = 2;
/// TRIG HIGH width required by the datasheet.
const TRIGGER_PULSE_US: u32 = 10;

/// Free-running microsecond counter used to time the echo pulse.
pub trait MicrosClock {
    fn now_us(&self) -> u64;
}

/// Convert an echo pulse width to a one-way distance.
pub fn echo_to_cm(pulse_us: u64) -> f32 {
    pulse_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

pub struct UltrasonicSensor<T, E, D, C> {
    trig: T,
    echo: E,
    delay: D,
    clock: C,
    echo_timeout_us: u32,
    max_range_cm: f32,
}

impl<T, E, D, C> UltrasonicSensor<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MicrosClock,
{
    pub fn new(trig: T, echo: E, delay: D, clock: C, echo_timeout_us: u32, max_range_cm: f32) -> Self {
        Self {
            trig,
            echo,
            delay,
            clock,
            echo_timeout_us,
            max_range_cm,
        }
    }

    /// Fire one ping and return the distance in centimetres.
    pub fn ping(&mut self) -> Result<f32, SensorError> {
        self.trig.set_low().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(SETTLE_US);
        self.trig.set_high().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trig.set_low().map_err(|_| SensorError::GpioWriteFailed)?;

        let width_us = self.echo_pulse_us()?;
        let cm = echo_to_cm(width_us);
        debug!("HC-SR04: echo {}us -> {:.2}cm", width_us, cm);

        if cm <= 0.0 || cm > self.max_range_cm {
            return Err(SensorError::OutOfRange);
        }
        Ok(cm)
    }

    /// Width of the next HIGH pulse on ECHO.
    fn echo_pulse_us(&mut self) -> Result<u64, SensorError> {
        let timeout = u64::from(self.echo_timeout_us);

        let wait_start = self.clock.now_us();
        while !self.echo_high()? {
            if self.clock.now_us().wrapping_sub(wait_start) >= timeout {
                return Err(SensorError::EchoTimeout);
            }
        }

        let rise = self.clock.now_us();
        while self.echo_high()? {
            if self.clock.now_us().wrapping_sub(rise) >= timeout {
                return Err(SensorError::EchoTimeout);
            }
        }
        Ok(self.clock.now_us().wrapping_sub(rise))
    }

    fn echo_high(&mut self) -> Result<bool, SensorError> {
        self.echo.is_high().map_err(|_| SensorError::GpioReadFailed)
    }
}

impl<T, E, D, C> RangeSensorPort for UltrasonicSensor<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MicrosClock,
{
    fn measure(&mut self) -> RangeReading {
        match self.ping() {
            Ok(cm) => RangeReading::Valid(cm),
            Err(e) => RangeReading::Invalid(e),
        }
    }
}
