//! The extracted date-of-birth value.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::pattern::DOB_EXACT;

/// A date-like substring pulled out of recognized text.
///
/// Always exactly `DD?DD?DDDD` with `?` being `-` or `/`. The text is kept as
/// found; it is not guaranteed to be a real calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateOfBirth(String);

/// Which field comes first in a `DD?DD?DDDD` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// Day, month, year.
    DayFirst,
    /// Month, day, year.
    MonthFirst,
}

/// One valid calendar interpretation of a [`DateOfBirth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarReading {
    pub order: DateOrder,
    pub date: NaiveDate,
}

impl DateOfBirth {
    pub(crate) fn from_match(text: &str) -> Self {
        Self(text.to_string())
    }

    /// Accept a string only if it is exactly one date-like token.
    pub fn parse(text: &str) -> Option<Self> {
        DOB_EXACT.is_match(text).then(|| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn fields(&self) -> (u32, u32, i32) {
        // Shape is guaranteed ASCII `DD?DD?DDDD`.
        let first = self.0[0..2].parse().unwrap_or(0);
        let second = self.0[3..5].parse().unwrap_or(0);
        let year = self.0[6..10].parse().unwrap_or(0);
        (first, second, year)
    }

    /// Valid calendar dates this string can stand for, day-first reading first.
    pub fn calendar_readings(&self) -> Vec<CalendarReading> {
        let (first, second, year) = self.fields();

        [
            (DateOrder::DayFirst, second, first),
            (DateOrder::MonthFirst, first, second),
        ]
        .into_iter()
        .filter_map(|(order, month, day)| {
            NaiveDate::from_ymd_opt(year, month, day).map(|date| CalendarReading { order, date })
        })
        .collect()
    }

    /// Human-readable problems with treating this string as a birth date.
    pub fn calendar_warnings(&self) -> Vec<String> {
        let readings = self.calendar_readings();

        match readings.as_slice() {
            [] => vec![format!("{} is not a valid calendar date", self)],
            [a, b] if a.date != b.date => vec![format!(
                "{} is ambiguous: {} (day first) or {} (month first)",
                self, a.date, b.date
            )],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for DateOfBirth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DateOfBirth {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DateOfBirth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if DOB_EXACT.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(format!("not a DD-DD-DDDD or DD/DD/DDDD date: {}", value))
        }
    }
}

impl From<DateOfBirth> for String {
    fn from(value: DateOfBirth) -> Self {
        value.0
    }
}
