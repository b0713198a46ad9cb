//! Business time is naive local time: routes, bookings and notification
//! timestamps are stored without a zone, at a fixed offset from UTC.

use chrono::{Duration, NaiveDateTime, Timelike, Utc};

#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: Duration,
}

impl LocalClock {
    pub fn new(utc_offset_hours: i64) -> Self {
        Self {
            offset: Duration::hours(utc_offset_hours),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + self.offset
    }

    /// Current local time truncated to the minute, as notifications record it
    pub fn now_minute(&self) -> NaiveDateTime {
        truncate_to_minute(self.now())
    }
}

pub fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}
