//! Daily relay window and wall-clock types.
//!
//! A [`Period`] is a recurring time-of-day window during which the relay is
//! commanded ON. The window may wrap past midnight: `start > end` means
//! "from start, through midnight, until end". The end is exclusive.

use serde::{Deserialize, Serialize};

/// Hours/minutes of a wall-clock reading. Produced by the clock adapter
/// only once SNTP has synced; before that the adapter yields `None` and
/// the scheduler skips window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTime {
    pub hour: u8,
    pub minute: u8,
}

impl DayTime {
    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

/// A daily ON window, persisted across reboots as a postcard blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

/// Field failed its range check (hour 0–23, minute 0–59).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError;

impl core::fmt::Display for RangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "hour must be 0-23 and minute 0-59")
    }
}

impl Period {
    /// Window used until a PERIOD command or a stored blob overrides it.
    pub const DEFAULT: Self = Self {
        start_hour: 7,
        start_minute: 0,
        end_hour: 22,
        end_minute: 0,
    };

    /// Validated constructor. The codec hands raw bytes straight through;
    /// this is the single place the range invariant is enforced.
    pub fn new(
        start_hour: u8,
        start_minute: u8,
        end_hour: u8,
        end_minute: u8,
    ) -> Result<Self, RangeError> {
        if start_hour > 23 || end_hour > 23 || start_minute > 59 || end_minute > 59 {
            return Err(RangeError);
        }
        Ok(Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        })
    }

    /// The four fields in wire order.
    pub fn as_bytes(self) -> [u8; 4] {
        [
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
        ]
    }

    /// Wraparound-aware containment test, end-exclusive.
    ///
    /// `start <= end`: in window iff `start <= now < end`.
    /// `start > end` (wraps midnight): in window iff `now >= start || now < end`.
    pub fn contains(self, now: DayTime) -> bool {
        let start = u16::from(self.start_hour) * 60 + u16::from(self.start_minute);
        let end = u16::from(self.end_hour) * 60 + u16::from(self.end_minute);
        let now = now.minutes();

        if start <= end {
            start <= now && now < end
        } else {
            now >= start || now < end
        }
    }

    /// Pack into a `u32` for the lock-free update queue.
    pub fn pack(self) -> u32 {
        u32::from_be_bytes(self.as_bytes())
    }

    /// Inverse of [`pack`](Self::pack). The queue only ever holds values
    /// that passed [`new`](Self::new), so no re-validation happens here.
    pub fn unpack(raw: u32) -> Self {
        let [start_hour, start_minute, end_hour, end_minute] = raw.to_be_bytes();
        Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}h{:02} - {}h{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }
}
