//! Typed accessors over the raw [`StoragePort`] capability.
//!
//! Two read disciplines live here, and the difference is deliberate:
//!
//! - **String fields** (`ssid`, `pass`, `address`) are *self-healing*: a
//!   missing key writes the compiled-in default back so the store converges
//!   to a fully populated state after first use.
//! - **The period blob** is *not* healed: absence is the expected state on
//!   first boot and the scheduler simply keeps its default until a command
//!   arrives.

use log::{info, warn};

use crate::period::Period;
use crate::ports::{StoragePort, StoreError};

/// Read a string field, healing a missing key with `default`.
///
/// Any storage failure other than `NotFound` also falls back to the
/// default, but without writing (the store may be wedged; don't make it
/// worse).
pub fn read_string_or_heal<const N: usize>(
    store: &mut impl StoragePort,
    key: &str,
    default: &str,
) -> heapless::String<N> {
    let mut buf = [0u8; N];
    match store.get(key, &mut buf) {
        Ok(len) => match core::str::from_utf8(&buf[..len]) {
            Ok(s) => {
                let mut out = heapless::String::new();
                if out.push_str(s).is_ok() {
                    return out;
                }
                warn!("store: value for '{key}' exceeds {N} bytes, using default");
                fallback(default)
            }
            Err(_) => {
                warn!("store: value for '{key}' is not UTF-8, using default");
                fallback(default)
            }
        },
        Err(StoreError::NotFound) => {
            info!("store: '{key}' not set, writing default");
            if store.set(key, default.as_bytes()).is_ok() {
                if let Err(e) = store.commit() {
                    warn!("store: commit of default '{key}' failed: {e}");
                }
            }
            fallback(default)
        }
        Err(e) => {
            warn!("store: reading '{key}' failed: {e}, using default");
            fallback(default)
        }
    }
}

fn fallback<const N: usize>(default: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    // Compiled-in defaults are sized to their fields (checked in config tests).
    out.push_str(default).ok();
    out
}

/// Load the persisted period blob. `Ok(None)` means "not stored yet" —
/// the caller keeps its default and nothing is written back.
pub fn load_period(store: &impl StoragePort) -> Result<Option<Period>, StoreError> {
    let mut buf = [0u8; 16];
    match store.get(crate::config::KEY_PERIOD, &mut buf) {
        Ok(len) => match postcard::from_bytes::<Period>(&buf[..len]) {
            Ok(p) => Ok(Some(p)),
            Err(_) => {
                warn!("store: period blob corrupt, falling back to default");
                Ok(None)
            }
        },
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Persist the period blob (set + commit).
pub fn save_period(store: &mut impl StoragePort, period: Period) -> Result<(), StoreError> {
    let mut buf = [0u8; 16];
    let blob = postcard::to_slice(&period, &mut buf).map_err(|_| StoreError::Io)?;
    store.set(crate::config::KEY_PERIOD, blob)?;
    store.commit()
}
