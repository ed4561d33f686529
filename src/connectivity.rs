//! WiFi connectivity state machine.
//!
//! An explicit `(state, event) -> (state, effects)` transition function —
//! testable with no network hardware. The platform adapter
//! ([`adapters::wifi`](crate::adapters::wifi)) feeds link events in and
//! executes the returned effects against the real driver.
//!
//! ```text
//!          Started                LinkUp/AddressAcquired
//!  Idle ───────────▶ Connecting ─────────────────────────▶ Connected
//!                     │    ▲                                   │
//!        Disconnected │    │ Connect (n < M)      Disconnected │
//!                     ▼    │                                   ▼
//!                RetryingPrimary(n) ◀──────────────────────────┘
//!                     │
//!                     │ n == M, fallback not yet used (latched)
//!                     ▼
//!                TryingFallback ── Disconnected ──▶ Failed (restart scheduled)
//! ```
//!
//! Retry budget: M primary attempts, then exactly one fallback attempt.
//! The fallback latch is per boot — once used, any further exhaustion goes
//! straight to `Failed`, so total attempts are bounded by M + 1.

use log::{info, warn};

use crate::config::MAX_PRIMARY_RETRIES;

// ───────────────────────────────────────────────────────────────
// States, events, effects
// ───────────────────────────────────────────────────────────────

/// Link bring-up state. Held in memory only; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    /// `n` = connect attempts already spent against the current config.
    RetryingPrimary(u8),
    TryingFallback,
    /// Terminal for this boot cycle; a delayed restart is already
    /// scheduled when this state is entered.
    Failed,
}

/// Inputs delivered by the platform's WiFi event dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Station interface started.
    Started,
    /// Link-layer association succeeded.
    LinkUp,
    /// DHCP (or static config) produced a usable address.
    AddressAcquired,
    /// Association failed or an established link dropped.
    Disconnected,
}

/// Outputs for the adapter to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Issue a connect attempt with the currently applied credentials.
    Connect,
    /// Reconfigure the driver with the compiled-in fallback credentials.
    UseFallbackConfig,
    /// The link is usable — unblock whoever is waiting on bring-up.
    SignalReady,
    /// Schedule the full-device restart that ends a failed boot cycle.
    ScheduleRestart,
}

/// Effects emitted by one transition, in execution order.
pub type Effects = heapless::Vec<Effect, 2>;

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

pub struct ConnectivityManager {
    state: ConnectionState,
    /// Connect attempts spent against the currently applied credentials.
    attempts: u8,
    /// Per-boot latch: at most one switch to the fallback network.
    fallback_used: bool,
    max_attempts: u8,
}

impl ConnectivityManager {
    pub fn new() -> Self {
        Self::with_budget(MAX_PRIMARY_RETRIES)
    }

    /// Budget injection for tests.
    pub fn with_budget(max_attempts: u8) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            fallback_used: false,
            max_attempts,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    /// Advance the machine by one event.
    pub fn handle(&mut self, event: LinkEvent) -> Effects {
        use ConnectionState as S;
        use LinkEvent as E;

        let mut effects = Effects::new();
        let prev = self.state;

        match (self.state, event) {
            (S::Idle, E::Started) => {
                self.attempts = 1;
                self.state = S::Connecting;
                effects.push(Effect::Connect).ok();
            }

            (S::Connecting | S::RetryingPrimary(_) | S::TryingFallback, E::LinkUp) => {
                self.attempts = 0;
                self.state = S::Connected;
            }

            // GOT_IP can arrive while we still consider ourselves
            // connecting (the driver races association and DHCP).
            (S::Connecting | S::RetryingPrimary(_) | S::TryingFallback | S::Connected, E::AddressAcquired) => {
                self.attempts = 0;
                self.state = S::Connected;
                effects.push(Effect::SignalReady).ok();
            }

            (S::Connecting | S::RetryingPrimary(_), E::Disconnected) => {
                if self.attempts < self.max_attempts {
                    self.attempts += 1;
                    self.state = S::RetryingPrimary(self.attempts);
                    effects.push(Effect::Connect).ok();
                } else if !self.fallback_used {
                    warn!("link: primary network abandoned after {} attempts, trying fallback", self.attempts);
                    self.fallback_used = true;
                    self.attempts = 1;
                    self.state = S::TryingFallback;
                    effects.push(Effect::UseFallbackConfig).ok();
                    effects.push(Effect::Connect).ok();
                } else {
                    self.state = S::Failed;
                    effects.push(Effect::ScheduleRestart).ok();
                }
            }

            (S::Connected, E::Disconnected) => {
                // A drop after a successful association restarts the retry
                // budget against the currently applied credentials.
                self.attempts = 1;
                self.state = S::RetryingPrimary(1);
                effects.push(Effect::Connect).ok();
            }

            (S::TryingFallback, E::Disconnected) => {
                // The fallback gets exactly one attempt.
                self.state = S::Failed;
                effects.push(Effect::ScheduleRestart).ok();
            }

            // Failed is absorbing; anything else is a stale or duplicate
            // event for the current state.
            _ => {}
        }

        if self.state != prev {
            info!("link: {:?} -> {:?}", prev, self.state);
        }
        effects
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
