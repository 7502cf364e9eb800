//! Wall-clock time-of-day at minute resolution.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::task::TaskValidationError;

const MINUTES_PER_DAY: u32 = 24 * 60;

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("valid time regex"));

/// Hour and minute at which a task becomes due.
///
/// Serialized as `HH:MM`. Seconds are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    /// Builds a time from hour `0..=23` and minute `0..=59`.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                minutes: (hour * 60 + minute) as u16,
            })
        } else {
            None
        }
    }

    /// Parses `H:MM` or `HH:MM`.
    pub fn parse(value: &str) -> Result<Self, TaskValidationError> {
        let trimmed = value.trim();
        let captures = TIME_OF_DAY_RE
            .captures(trimmed)
            .ok_or_else(|| TaskValidationError::InvalidTime(trimmed.to_string()))?;
        let hour = captures[1]
            .parse::<u32>()
            .map_err(|_| TaskValidationError::InvalidTime(trimmed.to_string()))?;
        let minute = captures[2]
            .parse::<u32>()
            .map_err(|_| TaskValidationError::InvalidTime(trimmed.to_string()))?;
        Self::from_hm(hour, minute).ok_or_else(|| TaskValidationError::InvalidTime(trimmed.to_string()))
    }

    /// Truncates a timestamp to its hour and minute.
    pub fn of(datetime: &NaiveDateTime) -> Self {
        Self {
            minutes: (datetime.hour() * 60 + datetime.minute()) as u16,
        }
    }

    pub fn hour(self) -> u32 {
        u32::from(self.minutes) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minutes) % 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or_default()
    }

    /// Anchors this time on `date`.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }

    /// Adds `minutes`, wrapping at midnight.
    ///
    /// Returns the new time and the number of day boundaries crossed.
    pub fn add_minutes(self, minutes: u32) -> (Self, u32) {
        let total = u64::from(self.minutes) + u64::from(minutes);
        let per_day = u64::from(MINUTES_PER_DAY);
        let wrapped = Self {
            minutes: (total % per_day) as u16,
        };
        (wrapped, (total / per_day) as u32)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TaskValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TaskValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::TimeOfDay;

    #[test]
    fn parse_accepts_single_digit_hour_and_pads_on_display() {
        let time = TimeOfDay::parse("9:05").unwrap();
        assert_eq!(time.hour(), 9);
        assert_eq!(time.minute(), 5);
        assert_eq!(time.to_string(), "09:05");
    }

    #[test]
    fn parse_rejects_out_of_range_and_garbage() {
        for value in ["24:00", "12:60", "noon", "", "12:5", "1200"] {
            assert!(TimeOfDay::parse(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn add_minutes_wraps_and_reports_day_carry() {
        let time = TimeOfDay::from_hm(23, 58).unwrap();
        let (snoozed, days) = time.add_minutes(5);
        assert_eq!(snoozed.to_string(), "00:03");
        assert_eq!(days, 1);

        let (same_day, days) = TimeOfDay::from_hm(9, 0).unwrap().add_minutes(5);
        assert_eq!(same_day.to_string(), "09:05");
        assert_eq!(days, 0);
    }

    #[test]
    fn serde_uses_hh_mm_string() {
        let time = TimeOfDay::from_hm(7, 30).unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"07:30\"");
        let back: TimeOfDay = serde_json::from_str("\"7:30\"").unwrap();
        assert_eq!(back, time);
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
