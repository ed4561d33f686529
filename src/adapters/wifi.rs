//! WiFi station adapter.
//!
//! Drives the pure [`ConnectivityManager`] state machine against the real
//! ESP-IDF WiFi driver (or a scriptable simulation on the host). The
//! machine decides *what* happens next; this adapter only executes the
//! effects — connect attempts, the fallback reconfiguration, the failure
//! restart — and feeds the resulting link events back in.
//!
//! Bring-up is blocking: the device has nothing useful to do before the
//! network exists, and the retry budget bounds the wait.

use std::collections::VecDeque;
use std::time::Duration;

use log::{info, warn};

use crate::config::{
    self, DEFAULT_PASS, DEFAULT_SSID, FALLBACK_PASS, FALLBACK_SSID, KEY_PASS, KEY_SSID, PASS_MAX,
    SSID_MAX,
};
use crate::connectivity::{ConnectivityManager, Effect, LinkEvent};
use crate::error::LinkError;
use crate::ports::{RestartPort, StoragePort};
use crate::store;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// One network identity, sized to the wire fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: heapless::String<SSID_MAX>,
    pub pass: heapless::String<PASS_MAX>,
}

impl Credentials {
    pub fn new(ssid: &str, pass: &str) -> Self {
        let mut c = Self {
            ssid: heapless::String::new(),
            pass: heapless::String::new(),
        };
        // Oversized inputs never get here: the store fields and the
        // compiled-in defaults are bounded to the same limits.
        c.ssid.push_str(ssid).ok();
        c.pass.push_str(pass).ok();
        c
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_SSID, FALLBACK_PASS)
    }
}

/// Primary credentials from the store, self-healing missing keys with the
/// compiled-in defaults.
pub fn load_credentials(storage: &mut impl StoragePort) -> Credentials {
    let ssid: heapless::String<SSID_MAX> =
        store::read_string_or_heal(storage, KEY_SSID, DEFAULT_SSID);
    let pass: heapless::String<PASS_MAX> =
        store::read_string_or_heal(storage, KEY_PASS, DEFAULT_PASS);
    Credentials { ssid, pass }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct WifiSupervisor<R: RestartPort> {
    mgr: ConnectivityManager,
    active: Credentials,
    restart: R,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

impl<R: RestartPort> WifiSupervisor<R> {
    /// Bring the link up, blocking until it is ready.
    ///
    /// On exhaustion of the M+1 attempt budget the failure restart is
    /// already scheduled when this returns `Err` — the caller only has to
    /// park.
    pub fn bring_up(&mut self) -> Result<(), LinkError> {
        info!("wifi: connecting to '{}'", self.active.ssid);
        self.apply_config(&self.active.clone());

        let mut pending: VecDeque<Effect> = self.mgr.handle(LinkEvent::Started).into_iter().collect();

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Connect => {
                    let events: &[LinkEvent] = if self.platform_connect() {
                        &[LinkEvent::LinkUp, LinkEvent::AddressAcquired]
                    } else {
                        &[LinkEvent::Disconnected]
                    };
                    for &event in events {
                        pending.extend(self.mgr.handle(event));
                    }
                }

                Effect::UseFallbackConfig => {
                    let fallback = Credentials::fallback();
                    info!("wifi: switching to fallback network '{}'", fallback.ssid);
                    self.platform_disconnect();
                    self.apply_config(&fallback);
                    self.active = fallback;
                }

                Effect::SignalReady => {
                    info!("wifi: connected to '{}', link ready", self.active.ssid);
                    return Ok(());
                }

                Effect::ScheduleRestart => {
                    warn!(
                        "wifi: impossible to connect, restarting in {} seconds",
                        config::LINK_FAILURE_RESTART_DELAY_SECS
                    );
                    self.restart.restart_after(Duration::from_secs(
                        config::LINK_FAILURE_RESTART_DELAY_SECS,
                    ));
                    return Err(LinkError::FallbackExhausted);
                }
            }
        }

        // The machine stalled without signalling — treat as exhausted.
        warn!("wifi: bring-up stalled in {:?}", self.mgr.state());
        Err(LinkError::FallbackExhausted)
    }

    pub fn state(&self) -> crate::connectivity::ConnectionState {
        self.mgr.state()
    }

    // ── Platform: ESP-IDF ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        primary: Credentials,
        restart: R,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        Ok(Self {
            mgr: ConnectivityManager::new(),
            active: primary,
            restart,
            wifi,
        })
    }

    #[cfg(target_os = "espidf")]
    fn apply_config(&mut self, creds: &Credentials) {
        let auth_method = if creds.pass.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let result = self
            .wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: creds.ssid.as_str().try_into().unwrap_or_default(),
                password: creds.pass.as_str().try_into().unwrap_or_default(),
                auth_method,
                ..Default::default()
            }));
        if let Err(e) = result {
            warn!("wifi: set_configuration failed: {e}");
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> bool {
        if !self.wifi.is_started().unwrap_or(false) {
            if let Err(e) = self.wifi.start() {
                warn!("wifi: start failed: {e}");
                return false;
            }
        }
        match self.wifi.connect() {
            Ok(()) => match self.wifi.wait_netif_up() {
                Ok(()) => true,
                Err(e) => {
                    warn!("wifi: netif up failed: {e}");
                    let _ = self.wifi.disconnect();
                    false
                }
            },
            Err(e) => {
                warn!("wifi: connect failed: {e}");
                false
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        info!("wifi: stopped");
    }

    // ── Platform: host simulation ─────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn new(primary: Credentials, restart: R) -> Self {
        Self::with_sim(primary, restart, SimLink::default())
    }

    /// Host-only: scriptable connect outcomes for supervisor tests.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_sim(primary: Credentials, restart: R, sim: SimLink) -> Self {
        Self {
            mgr: ConnectivityManager::new(),
            active: primary,
            restart,
            sim,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply_config(&mut self, creds: &Credentials) {
        self.sim.applied.push(creds.ssid.as_str().to_string());
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> bool {
        let outcome = self.sim.outcomes.pop_front().unwrap_or(true);
        info!(
            "wifi(sim): connect to '{}' -> {}",
            self.active.ssid,
            if outcome { "up" } else { "failed" }
        );
        outcome
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("wifi(sim): stopped");
    }
}

/// Scripted link behavior for host builds. Each queued outcome answers
/// one connect attempt; an empty queue means "succeed".
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimLink {
    pub outcomes: VecDeque<bool>,
    pub applied: Vec<String>,
}

#[cfg(not(target_os = "espidf"))]
impl SimLink {
    pub fn failing(attempts: usize) -> Self {
        Self {
            outcomes: std::iter::repeat(false).take(attempts).collect(),
            applied: Vec::new(),
        }
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::config::MAX_PRIMARY_RETRIES;
    use core::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CountingRestart(Arc<AtomicUsize>);

    impl RestartPort for CountingRestart {
        fn restart_after(&self, _delay: Duration) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn clean_first_attempt_comes_up() {
        let restart = CountingRestart::default();
        let mut sup = WifiSupervisor::new(Credentials::new("primary", "pw"), restart.clone());
        assert!(sup.bring_up().is_ok());
        assert_eq!(restart.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn primary_failures_fall_back_then_succeed() {
        let restart = CountingRestart::default();
        let sim = SimLink::failing(MAX_PRIMARY_RETRIES as usize);
        let mut sup =
            WifiSupervisor::with_sim(Credentials::new("primary", "pw"), restart.clone(), sim);

        assert!(sup.bring_up().is_ok());
        // Primary config applied first, fallback applied exactly once.
        assert_eq!(sup.sim.applied.first().map(String::as_str), Some("primary"));
        assert_eq!(
            sup.sim.applied.last().map(String::as_str),
            Some(FALLBACK_SSID)
        );
        assert_eq!(restart.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn full_exhaustion_schedules_exactly_one_restart() {
        let restart = CountingRestart::default();
        let sim = SimLink::failing(MAX_PRIMARY_RETRIES as usize + 1);
        let mut sup =
            WifiSupervisor::with_sim(Credentials::new("primary", "pw"), restart.clone(), sim);

        assert_eq!(sup.bring_up(), Err(LinkError::FallbackExhausted));
        assert_eq!(restart.0.load(Ordering::SeqCst), 1);
        assert_eq!(
            sup.sim
                .applied
                .iter()
                .filter(|s| s.as_str() == FALLBACK_SSID)
                .count(),
            1,
            "fallback reconfiguration happens at most once per boot"
        );
    }
}
