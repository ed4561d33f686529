//! Autoswitch firmware library.
//!
//! Control core of a network-configurable relay controller: a UDP command
//! protocol, a time-window relay scheduler, a WiFi connectivity manager
//! with fallback, and the client-side reliable sender. Pure logic lives in
//! the top-level modules and runs anywhere; all ESP-IDF-specific code is
//! confined to the adapters and guarded by `#[cfg(target_os = "espidf")]`.

#![deny(unused_must_use)]

pub mod client;
pub mod config;
pub mod connectivity;
pub mod period;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod telemetry;

pub mod error;
pub mod pins;
pub mod ports;

pub mod adapters;
pub mod drivers;
