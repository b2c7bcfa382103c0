//! Host stand-in for a GPIO output.  Logs level changes at debug.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

pub struct SimPin {
    name: &'static str,
    high: bool,
}

impl SimPin {
    pub fn new(name: &'static str) -> Self {
        Self { name, high: false }
    }

    pub fn is_set_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        debug!("{}: LOW", self.name);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        debug!("{}: HIGH", self.name);
        Ok(())
    }
}
