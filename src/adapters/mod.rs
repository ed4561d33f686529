//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter   | Implements    | Connects to                      |
//! |-----------|---------------|----------------------------------|
//! | `nvs`     | StoragePort   | NVS flash / in-memory store      |
//! | `gpio`    | GpioPort      | ESP32 GPIO matrix                |
//! | `time`    | —             | system clock + SNTP sync         |
//! | `restart` | RestartPort   | `esp_restart` on a delay thread  |
//! | `wifi`    | —             | ESP-IDF WiFi STA / simulation    |
//!
//! Every adapter is dual-target: real driver calls under
//! `target_os = "espidf"`, a simulation backend everywhere else so the
//! whole stack runs on the host.

pub mod gpio;
pub mod nvs;
pub mod restart;
pub mod time;
pub mod wifi;
