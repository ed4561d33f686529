//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over the ESP-IDF NVS C API with raw sys
//! calls behind an open-use-close helper; host builds get an in-memory
//! backend with the same staged-commit discipline.
//!
//! `set` stages a write; `commit` makes every staged write durable in one
//! handle session. Each key's set+commit is atomic at the NVS level —
//! there is no cross-key transaction, and none is needed (the server and
//! scheduler tasks own disjoint keys).

use log::info;

use crate::ports::{StoragePort, StoreError};

#[cfg(not(target_os = "espidf"))]
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Single flat namespace; every config key lives under it.
#[cfg(target_os = "espidf")]
const NAMESPACE: &str = "storage";

/// NVS keys are limited to 15 bytes plus the terminator.
#[cfg(target_os = "espidf")]
const KEY_BUF: usize = 16;

pub struct NvsStore {
    /// Writes staged since the last commit (per handle/instance).
    staged: Vec<(String, Vec<u8>)>,
    #[cfg(not(target_os = "espidf"))]
    committed: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl NvsStore {
    /// Initialise NVS flash and return a store handle.
    ///
    /// On first boot or after a partition version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase run from the single
            // main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                log::warn!("nvs: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StoreError::Io);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StoreError::Io);
                }
            } else if ret != ESP_OK {
                return Err(StoreError::Io);
            }
            info!("nvs: flash initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("nvs: simulation backend");

        Ok(Self {
            staged: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            committed: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Open the namespace, run `f` with the handle, close it again.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = key_cstr(NAMESPACE);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

/// NUL-terminate a key into a fixed buffer (NVS limit is 15 chars).
#[cfg(target_os = "espidf")]
fn key_cstr(key: &str) -> [u8; KEY_BUF] {
    let mut buf = [0u8; KEY_BUF];
    let bytes = key.as_bytes();
    let len = bytes.len().min(KEY_BUF - 1);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

impl StoragePort for NvsStore {
    fn get(&self, key: &str, buf: &mut [u8]) -> Result<usize, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let committed = self.committed.lock().expect("nvs sim lock poisoned");
            match committed.get(key) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StoreError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                let k = key_cstr(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        k.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StoreError::NotFound),
                Err(_) => Err(StoreError::Io),
            }
        }
    }

    fn set(&mut self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.staged.push((key.to_string(), data.to_vec()));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.staged.is_empty() {
            return Ok(());
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let mut committed = self.committed.lock().expect("nvs sim lock poisoned");
            for (key, data) in self.staged.drain(..) {
                committed.insert(key, data);
            }
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let staged = core::mem::take(&mut self.staged);
            let result = Self::with_nvs_handle(true, |handle| {
                for (key, data) in &staged {
                    let k = key_cstr(key);
                    let ret = unsafe {
                        nvs_set_blob(
                            handle,
                            k.as_ptr() as *const _,
                            data.as_ptr() as *const _,
                            data.len(),
                        )
                    };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("nvs: committed {} staged write(s)", staged.len());
                    Ok(())
                }
                Err(e) => {
                    log::warn!("nvs: commit failed (err {e})");
                    Err(StoreError::Io)
                }
            }
        }
    }
}

/// Handles share the committed state; staged writes stay per-handle, like
/// independent NVS handles on the device.
impl Clone for NvsStore {
    fn clone(&self) -> Self {
        Self {
            staged: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            committed: Arc::clone(&self.committed),
        }
    }
}
