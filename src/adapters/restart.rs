//! Restart adapter.
//!
//! Schedules `esp_restart` on a detached thread so the caller can finish
//! draining replies before the device goes down. There is no cancellation;
//! a scheduled restart always lands.

use core::time::Duration;

use log::info;

use crate::ports::RestartPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRestart;

impl RestartPort for SystemRestart {
    #[cfg(target_os = "espidf")]
    fn restart_after(&self, delay: Duration) {
        info!("restart: scheduled in {}s", delay.as_secs());
        std::thread::Builder::new()
            .name("restart".into())
            .spawn(move || {
                std::thread::sleep(delay);
                unsafe { esp_idf_svc::sys::esp_restart() };
            })
            .expect("failed to spawn restart thread");
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart_after(&self, delay: Duration) {
        info!("restart(sim): would restart in {}s", delay.as_secs());
    }
}
