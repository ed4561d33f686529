//! Relay window scheduler.
//!
//! ```text
//! ┌──────────────┐  push   ┌──────────────┐  pop (≤1/tick)  ┌───────────────┐
//! │ UDP command  │────────▶│ PeriodQueue  │────────────────▶│ RelayScheduler│
//! │ server task  │         │ (lock-free)  │                 │ 1 Hz tick     │
//! └──────────────┘         └──────────────┘                 └───────┬───────┘
//!                                                                   │
//!                                                      persist blob │ guarded
//!                                                      + window eval▼ actuation
//! ```
//!
//! The scheduler owns the live [`Period`] and the relay drive state; the
//! server never mutates either directly, it only enqueues. The queue is a
//! single-producer single-consumer atomic ring: the server task pushes,
//! the scheduler task pops, and a full queue drops the new update rather
//! than blocking the network path.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use log::{debug, info, warn};

use crate::drivers::relay::RelayDriver;
use crate::period::{DayTime, Period};
use crate::ports::{GpioPort, StoragePort};
use crate::store;

// ═══════════════════════════════════════════════════════════════
//  Period update queue
// ═══════════════════════════════════════════════════════════════

/// Maximum number of pending period updates.
pub const QUEUE_CAP: usize = 5;

/// Ring size: one slot is sacrificed to distinguish full from empty.
const QUEUE_SLOTS: usize = QUEUE_CAP + 1;

/// Lock-free SPSC ring carrying packed [`Period`] values.
///
/// Producer: the UDP server task. Consumer: the scheduler task. The packed
/// `u32` representation keeps every slot a single atomic — no unsafe
/// buffer access is needed.
pub struct PeriodQueue {
    slots: [AtomicU32; QUEUE_SLOTS],
    head: AtomicU8,
    tail: AtomicU8,
}

impl PeriodQueue {
    #[allow(clippy::declare_interior_mutable_const)]
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            slots: [ZERO; QUEUE_SLOTS],
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
        }
    }

    /// Enqueue an update. Non-blocking; returns `false` when the queue is
    /// full and the update was dropped.
    pub fn push(&self, period: Period) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next_head = (head + 1) % QUEUE_SLOTS as u8;

        if next_head == tail {
            return false; // Full — drop rather than block the sender.
        }

        self.slots[head as usize].store(period.pack(), Ordering::Relaxed);
        self.head.store(next_head, Ordering::Release);
        true
    }

    /// Dequeue the oldest update, if any.
    pub fn pop(&self) -> Option<Period> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None; // Empty.
        }

        let raw = self.slots[tail as usize].load(Ordering::Relaxed);
        self.tail
            .store((tail + 1) % QUEUE_SLOTS as u8, Ordering::Release);
        Some(Period::unpack(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed) as usize;
        let tail = self.tail.load(Ordering::Relaxed) as usize;
        (head + QUEUE_SLOTS - tail) % QUEUE_SLOTS
    }
}

impl Default for PeriodQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Owns the live window and the relay state; ticked at 1 Hz.
pub struct RelayScheduler<'q> {
    queue: &'q PeriodQueue,
    period: Period,
    relay: RelayDriver,
}

impl<'q> RelayScheduler<'q> {
    pub fn new(queue: &'q PeriodQueue, relay: RelayDriver) -> Self {
        Self {
            queue,
            period: Period::DEFAULT,
            relay,
        }
    }

    /// Load the persisted window. A missing blob keeps the compiled-in
    /// default and — unlike the string fields — is not written back:
    /// an empty slot on first boot is the expected state, not damage to
    /// heal.
    pub fn load(&mut self, store: &impl StoragePort) {
        match store::load_period(store) {
            Ok(Some(p)) => {
                info!("scheduler: period loaded from store: {p}");
                self.period = p;
            }
            Ok(None) => {
                info!("scheduler: no stored period, using default {}", self.period);
            }
            Err(e) => {
                warn!("scheduler: period load failed ({e}), using default");
            }
        }
    }

    /// One scheduler cycle:
    ///
    /// 1. Drain at most one queued period update; persist it.
    /// 2. With a synced clock, evaluate window containment and issue at
    ///    most one relay transition. With `now == None` the evaluation is
    ///    skipped entirely — never actuate on a bogus clock.
    pub fn tick(
        &mut self,
        now: Option<DayTime>,
        storage: &mut impl StoragePort,
        gpio: &mut impl GpioPort,
    ) {
        if let Some(p) = self.queue.pop() {
            info!("scheduler: new period set: {p}");
            self.period = p;
            if let Err(e) = store::save_period(storage, p) {
                // Keep running on the in-memory value; the next update or
                // reboot retries persistence.
                warn!("scheduler: period persist failed: {e}");
            }
        }

        let Some(now) = now else {
            debug!("scheduler: clock not yet synced, skipping window evaluation");
            return;
        };

        let want_on = self.period.contains(now);
        if self.relay.switch(want_on, gpio) {
            info!(
                "scheduler: relay {} at {:02}:{:02} (window {})",
                if want_on { "on" } else { "off" },
                now.hour,
                now.minute,
                self.period
            );
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn relay_is_on(&self) -> bool {
        self.relay.is_on()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
