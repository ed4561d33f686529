//! Port traits — the boundary between the control core and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ domain (scheduler / server / telemetry)
//! ```
//!
//! Concrete adapters (NVS, GPIO, restart, HTTP client) implement these
//! traits; the domain modules consume them via generics and never touch
//! ESP-IDF directly. Everything above this boundary runs unchanged on the
//! host for tests.

use core::time::Duration;

// ───────────────────────────────────────────────────────────────
// Persistent storage port (key/blob store with commit semantics)
// ───────────────────────────────────────────────────────────────

/// Key/blob storage. Writes become durable on [`commit`](Self::commit);
/// each key's set+commit is independently atomic at the store level — no
/// cross-key transactions exist or are needed.
pub trait StoragePort {
    /// Read a value into `buf`, returning the number of bytes written.
    fn get(&self, key: &str, buf: &mut [u8]) -> Result<usize, StoreError>;

    /// Stage a value for the key.
    fn set(&mut self, key: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Flush staged writes to durable storage.
    fn commit(&mut self) -> Result<(), StoreError>;
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Requested key does not exist. Callers treat this as "use the
    /// compiled-in default", never as a failure.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    Io,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO port (domain → pin hardware)
// ───────────────────────────────────────────────────────────────

/// Pin drive configuration. The NC relay quirk lives here: the relay
/// conducts when its transistor pin is left undriven, so "on" is
/// [`Disabled`](PinMode::Disabled) rather than an active level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Pad disconnected from the GPIO matrix.
    Disabled,
    /// Push-pull output.
    Output,
    /// Open-drain output (readable back).
    OpenDrain,
}

/// Minimal pin capability: direction + level.
pub trait GpioPort {
    fn set_direction(&mut self, pin: u8, mode: PinMode);
    fn set_level(&mut self, pin: u8, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Restart port
// ───────────────────────────────────────────────────────────────

/// Full-device restart, scheduled rather than immediate so an in-flight
/// acknowledgment can drain first. There is no cancellation: once called,
/// the restart happens.
pub trait RestartPort {
    fn restart_after(&self, delay: Duration);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (telemetry reporter → network)
// ───────────────────────────────────────────────────────────────

/// Outbound HTTP POST used by the telemetry reporter. The implementation
/// (and the report body format) are outside the control core.
pub trait HttpPort {
    fn post(&mut self, url: &str, body: &[u8]) -> Result<(), HttpError>;
}

/// Opaque HTTP failure — the reporter only logs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpError;

impl core::fmt::Display for HttpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "http request failed")
    }
}
