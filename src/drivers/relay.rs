//! Normally-closed relay driver.
//!
//! The relay conducts when its transistor pin is undriven, so the two drive
//! sequences are asymmetric:
//!
//! | current | commanded | action                                   |
//! |---------|-----------|------------------------------------------|
//! | On      | On        | nothing                                  |
//! | Off     | Off       | nothing                                  |
//! | Off     | On        | disconnect the pad (pin mode Disabled)   |
//! | On      | Off       | open-drain the pad, drive the level low  |
//!
//! Repeating a command is a guaranteed no-op — the guard keeps the relay
//! coil from being re-driven every scheduler tick.

use log::debug;

use crate::ports::{GpioPort, PinMode};

pub struct RelayDriver {
    pin: u8,
    is_on: bool,
}

impl RelayDriver {
    /// A fresh driver assumes the boot state of the hardware: the pad is
    /// untouched, so the NC relay is conducting.
    pub fn new(pin: u8) -> Self {
        Self { pin, is_on: true }
    }

    /// Put the pin into the state matching the driver's assumption.
    /// Call once at boot before the first `switch`.
    pub fn init(&self, gpio: &mut impl GpioPort) {
        gpio.set_direction(self.pin, PinMode::Disabled);
    }

    /// Guarded transition. Returns `true` if a drive sequence ran.
    pub fn switch(&mut self, on: bool, gpio: &mut impl GpioPort) -> bool {
        if on == self.is_on {
            debug!("relay: already {} — no-op", state_name(on));
            return false;
        }
        if on {
            gpio.set_direction(self.pin, PinMode::Disabled);
        } else {
            gpio.set_direction(self.pin, PinMode::OpenDrain);
            gpio.set_level(self.pin, false);
        }
        self.is_on = on;
        true
    }

    /// Whether current is flowing through the relay.
    pub fn is_on(&self) -> bool {
        self.is_on
    }
}

fn state_name(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
