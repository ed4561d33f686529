//! Autoswitch firmware — device entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ boot                                                         │
//! │   NVS init ──▶ WiFi bring-up (blocking, M+1 budget) ──▶ SNTP │
//! │                                                              │
//! │ steady state                                                 │
//! │   [udp-server thread]   recv ─▶ dispatch ─▶ reply            │
//! │         │ period queue (lock-free, cap 5)                    │
//! │         ▼                                                    │
//! │   [main thread]         1 Hz scheduler tick ─▶ relay         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two tasks share nothing but the period queue and disjoint store
//! keys. Credential changes and connectivity failure both end in a
//! scheduled full restart — there is no in-place reconfiguration.

use std::time::Duration;

use anyhow::Result;
use log::{error, info};

use autoswitch::adapters::gpio::EspGpio;
use autoswitch::adapters::nvs::NvsStore;
use autoswitch::adapters::restart::SystemRestart;
use autoswitch::adapters::time::WallClock;
use autoswitch::adapters::wifi::{self, WifiSupervisor};
use autoswitch::config::COMMAND_PORT;
use autoswitch::drivers::relay::RelayDriver;
use autoswitch::drivers::status_led::StatusLed;
use autoswitch::pins;
use autoswitch::scheduler::{PeriodQueue, RelayScheduler};
use autoswitch::server::CommandServer;

/// Cross-task period update channel. The server thread produces, the
/// scheduler loop consumes.
static PERIOD_QUEUE: PeriodQueue = PeriodQueue::new();

fn main() -> Result<()> {
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger_init();

    info!("autoswitch v{} starting", env!("CARGO_PKG_VERSION"));

    // ── Storage ───────────────────────────────────────────────
    let mut store = NvsStore::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;

    // ── Pins ──────────────────────────────────────────────────
    let mut gpio = EspGpio::new();
    let mut led = StatusLed::new(pins::STATUS_LED_GPIO);
    led.init(&mut gpio);
    let relay = RelayDriver::new(pins::RELAY_GPIO);
    relay.init(&mut gpio);

    // ── Network bring-up (blocking) ───────────────────────────
    let credentials = wifi::load_credentials(&mut store);

    #[cfg(target_os = "espidf")]
    let mut supervisor = {
        let peripherals = esp_idf_svc::hal::prelude::Peripherals::take()?;
        let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
        let nvs_partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;
        WifiSupervisor::new(
            peripherals.modem,
            sysloop,
            nvs_partition,
            credentials,
            SystemRestart,
        )?
    };
    #[cfg(not(target_os = "espidf"))]
    let mut supervisor = WifiSupervisor::new(credentials, SystemRestart);

    if let Err(e) = supervisor.bring_up() {
        // The failure restart is already scheduled; park until it lands.
        error!("network bring-up failed: {e}");
        led.set(false, &mut gpio);
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }
    led.set(true, &mut gpio);

    // ── Wall clock ────────────────────────────────────────────
    let mut clock = WallClock::new();
    clock.start_sntp()?;

    // ── Command server task ───────────────────────────────────
    let server_store = store.clone();
    std::thread::Builder::new()
        .name("udp-server".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            CommandServer::new(COMMAND_PORT, server_store, SystemRestart).run(&PERIOD_QUEUE)
        })?;

    // ── Scheduler loop (main thread, 1 Hz) ────────────────────
    let mut scheduler = RelayScheduler::new(&PERIOD_QUEUE, relay);
    scheduler.load(&store);
    info!("system ready, entering scheduler loop");

    loop {
        scheduler.tick(clock.now(), &mut store, &mut gpio);
        std::thread::sleep(Duration::from_secs(1));
    }
}

/// Minimal stderr logger for host simulation runs; the device uses the
/// ESP-IDF logger instead.
#[cfg(not(target_os = "espidf"))]
fn env_logger_init() {
    struct StderrLogger;
    impl log::Log for StderrLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
        fn flush(&self) {}
    }
    static LOGGER: StderrLogger = StderrLogger;
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Info);
}
