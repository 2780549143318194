//! Wall-clock time of day, stored as minutes since midnight.
//!
//! The external contract is a zero-padded 24-hour `"HH:MM"` string.
//! Parsing is strict: exactly five characters, hours 00-23, minutes 00-59.
//! Internally everything is integer minutes, so ordering and arithmetic
//! need no string comparison tricks.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Build from minutes since midnight. Rejects values past 23:59.
    pub fn from_minutes(minutes: u16) -> Result<Self> {
        if minutes >= MINUTES_PER_DAY {
            return Err(Error::validation(format!(
                "time of day out of range: {} minutes",
                minutes
            )));
        }
        Ok(TimeOfDay(minutes))
    }

    pub fn from_hm(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::validation(format!(
                "invalid time of day: {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(TimeOfDay(hour as u16 * 60 + minute as u16))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    /// Subtract whole minutes, `None` if the result would cross midnight.
    pub fn checked_sub_minutes(self, minutes: u32) -> Option<TimeOfDay> {
        if minutes > self.0 as u32 {
            None
        } else {
            Some(TimeOfDay(self.0 - minutes as u16))
        }
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour() as u32, self.minute() as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        TimeOfDay((time.hour() * 60 + time.minute()) as u16)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("invalid HH:MM time: {:?}", value));

        let bytes = value.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = |range: std::ops::Range<usize>| -> Result<u8> {
            value[range].parse::<u8>().map_err(|_| invalid())
        };
        let hour = digits(0..2)?;
        let minute = digits(3..5)?;
        TimeOfDay::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
