//! Wall-clock adapter.
//!
//! The scheduler must never act on an unsynced clock, so [`WallClock::now`]
//! returns `None` until SNTP has produced a plausible time. The guard is a
//! plausibility check on the epoch seconds — a freshly booted device
//! reports 1970 until the first SNTP response lands.

use crate::period::DayTime;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::EspSntp;

/// Reject obviously unsynced time (anything before 2020-01-01).
#[cfg(target_os = "espidf")]
const EPOCH_2020: i64 = 1_577_836_800;

pub struct WallClock {
    /// Keeps the SNTP service alive for the program lifetime.
    #[cfg(target_os = "espidf")]
    _sntp: Option<EspSntp<'static>>,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            _sntp: None,
        }
    }

    /// Configure the timezone and start the SNTP client. Sync completes in
    /// the background; [`now`](Self::now) stays `None` until it does.
    #[cfg(target_os = "espidf")]
    pub fn start_sntp(&mut self) -> anyhow::Result<()> {
        // SAFETY: called once from the main task before the scheduler loop.
        unsafe {
            esp_idf_svc::sys::setenv(c"TZ".as_ptr(), c"UTC-1".as_ptr(), 1);
            esp_idf_svc::sys::tzset();
        }
        self._sntp = Some(EspSntp::new_default()?);
        log::info!("time: SNTP started (pool.ntp.org)");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start_sntp(&mut self) -> anyhow::Result<()> {
        log::info!("time(sim): host clock assumed synced");
        Ok(())
    }

    /// Local hour/minute, or `None` while the clock is unsynced.
    #[cfg(target_os = "espidf")]
    pub fn now(&self) -> Option<DayTime> {
        use esp_idf_svc::sys;

        let mut tv = sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }

        let secs = tv.tv_sec as sys::time_t;
        let mut tm: sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..=23).contains(&tm.tm_hour) || !(0..=59).contains(&tm.tm_min) {
            return None;
        }
        Some(DayTime {
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
        })
    }

    /// Host simulation: UTC derived from the system clock.
    #[cfg(not(target_os = "espidf"))]
    pub fn now(&self) -> Option<DayTime> {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();
        Some(DayTime {
            hour: ((secs / 3600) % 24) as u8,
            minute: ((secs / 60) % 60) as u8,
        })
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn host_clock_reports_valid_fields() {
        let clock = WallClock::new();
        let now = clock.now().expect("host clock is always synced");
        assert!(now.hour <= 23);
        assert!(now.minute <= 59);
    }
}
