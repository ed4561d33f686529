//! Link status LED. Lit while the station is associated with an AP.

use crate::ports::{GpioPort, PinMode};

pub struct StatusLed {
    pin: u8,
    lit: bool,
}

impl StatusLed {
    pub fn new(pin: u8) -> Self {
        Self { pin, lit: false }
    }

    /// Configure the pad as a push-pull output, dark.
    pub fn init(&mut self, gpio: &mut impl GpioPort) {
        gpio.set_direction(self.pin, PinMode::Output);
        gpio.set_level(self.pin, false);
        self.lit = false;
    }

    pub fn set(&mut self, lit: bool, gpio: &mut impl GpioPort) {
        gpio.set_level(self.pin, lit);
        self.lit = lit;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
