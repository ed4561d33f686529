//! GPIO adapter.
//!
//! Implements [`GpioPort`] with raw ESP-IDF sys calls (pad select +
//! direction + level). The host backend records the last direction and
//! level per pin so tests and the simulation can observe pin state.

use crate::ports::{GpioPort, PinMode};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

pub struct EspGpio {
    #[cfg(not(target_os = "espidf"))]
    pins: HashMap<u8, (PinMode, bool)>,
}

impl EspGpio {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            pins: HashMap::new(),
        }
    }

    /// Simulation only: observe the last (mode, level) applied to a pin.
    #[cfg(not(target_os = "espidf"))]
    pub fn pin_state(&self, pin: u8) -> Option<(PinMode, bool)> {
        self.pins.get(&pin).copied()
    }
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpio {
    fn set_direction(&mut self, pin: u8, mode: PinMode) {
        #[cfg(target_os = "espidf")]
        {
            let gpio_mode = match mode {
                PinMode::Disabled => gpio_mode_t_GPIO_MODE_DISABLE,
                PinMode::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
                PinMode::OpenDrain => gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
            };
            // SAFETY: plain register configuration; pin numbers come from
            // the compiled-in pin map.
            unsafe {
                esp_rom_gpio_pad_select_gpio(pin as u32);
                gpio_set_direction(pin as i32, gpio_mode);
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let level = self.pins.get(&pin).map(|&(_, l)| l).unwrap_or(false);
            self.pins.insert(pin, (mode, level));
            log::debug!("gpio(sim): pin {pin} mode {mode:?}");
        }
    }

    fn set_level(&mut self, pin: u8, high: bool) {
        #[cfg(target_os = "espidf")]
        // SAFETY: see set_direction.
        unsafe {
            gpio_set_level(pin as i32, u32::from(high));
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let mode = self
                .pins
                .get(&pin)
                .map(|&(m, _)| m)
                .unwrap_or(PinMode::Disabled);
            self.pins.insert(pin, (mode, high));
            log::debug!("gpio(sim): pin {pin} level {high}");
        }
    }
}
