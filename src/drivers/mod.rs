//! Actuator drivers. Dumb state holders — policy (when to switch) lives in
//! the scheduler and connectivity manager; drivers only translate a desired
//! state into pin operations through [`GpioPort`](crate::ports::GpioPort).

pub mod relay;
pub mod status_led;
