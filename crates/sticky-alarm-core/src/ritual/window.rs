//! Active-window evaluation.
//!
//! The ritual is enforced inside a daily window given as two wall-clock
//! times. A window whose start is later than its end wraps past midnight
//! (e.g. 20:00 - 04:00). Only hour and minute are considered; seconds of
//! `now` are ignored.

use std::fmt;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Is `now` inside the window `[start, end)`, both given as minute-of-day?
///
/// `start <= end` is a same-day window (an empty one when equal); otherwise
/// the window runs from `start` to midnight and from midnight to `end`.
pub fn in_window<T: Timelike>(now: &T, start: u16, end: u16) -> bool {
    let current = (now.hour() * 60 + now.minute()) as u16;

    if start <= end {
        start <= current && current < end
    } else {
        current >= start || current < end
    }
}

/// An hour/minute pair on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Out-of-range parts are clamped to 23:59.
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The configured daily window during which the ritual is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl ActiveWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn contains<T: Timelike>(&self, now: &T) -> bool {
        in_window(now, self.start.minute_of_day(), self.end.minute_of_day())
    }

    /// True when the window wraps past midnight.
    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
