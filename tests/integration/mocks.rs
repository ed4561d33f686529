//! Mock adapters for integration tests.
//!
//! Record every capability call so tests can assert on full histories
//! without touching NVS flash, GPIO registers, or `esp_restart`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoswitch::ports::{GpioPort, PinMode, RestartPort, StoragePort, StoreError};

// ── Storage ───────────────────────────────────────────────────

/// In-memory store with observable commit behavior.
#[derive(Default)]
pub struct MockStore {
    pub committed: HashMap<String, Vec<u8>>,
    staged: Vec<(String, Vec<u8>)>,
    pub commits: usize,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed_str(&self, key: &str) -> Option<&str> {
        self.committed
            .get(key)
            .and_then(|v| core::str::from_utf8(v).ok())
    }

    /// Pre-populate a committed value.
    pub fn seed(&mut self, key: &str, value: &[u8]) {
        self.committed.insert(key.to_string(), value.to_vec());
    }
}

impl StoragePort for MockStore {
    fn get(&self, key: &str, buf: &mut [u8]) -> Result<usize, StoreError> {
        let data = self.committed.get(key).ok_or(StoreError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn set(&mut self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.staged.push((key.to_string(), data.to_vec()));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        for (key, data) in self.staged.drain(..) {
            self.committed.insert(key, data);
        }
        self.commits += 1;
        Ok(())
    }
}

// ── GPIO ──────────────────────────────────────────────────────

/// Records every pin operation in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOp {
    Direction(u8, PinMode),
    Level(u8, bool),
}

#[derive(Default)]
pub struct MockGpio {
    pub ops: Vec<PinOp>,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops_for(&self, pin: u8) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PinOp::Direction(p, _) | PinOp::Level(p, _) if *p == pin))
            .count()
    }
}

impl GpioPort for MockGpio {
    fn set_direction(&mut self, pin: u8, mode: PinMode) {
        self.ops.push(PinOp::Direction(pin, mode));
    }

    fn set_level(&mut self, pin: u8, high: bool) {
        self.ops.push(PinOp::Level(pin, high));
    }
}

// ── Restart ───────────────────────────────────────────────────

/// Counts scheduled restarts and remembers the last delay. Cloneable so a
/// test can keep a handle while the server owns another.
#[derive(Clone, Default)]
pub struct MockRestart {
    count: Arc<AtomicUsize>,
    last_delay: Arc<Mutex<Option<Duration>>>,
}

#[allow(dead_code)]
impl MockRestart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last_delay(&self) -> Option<Duration> {
        *self.last_delay.lock().unwrap()
    }
}

impl RestartPort for MockRestart {
    fn restart_after(&self, delay: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last_delay.lock().unwrap() = Some(delay);
    }
}
