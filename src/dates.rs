//! Calendar-day windows in UTC
//!
//! A job covers exactly one UTC day: from `00:00:00Z` to `23:59:59Z`.

use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format accepted for date input
pub const ISO_DATE: &str = "%Y-%m-%d";

/// A single UTC calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateWindow {
    date: NaiveDate,
}

impl DateWindow {
    /// Create a window for the given date
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parse a strict `YYYY-MM-DD` date
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidDateFormat {
            input: input.to_string(),
        };

        // chrono accepts unpadded fields, the canonical form does not
        if input.len() != 10 {
            return Err(invalid());
        }

        NaiveDate::parse_from_str(input, ISO_DATE)
            .map(Self::new)
            .map_err(|_| invalid())
    }

    /// The day before today, in UTC
    pub fn yesterday() -> Self {
        Self::new(Utc::now().date_naive() - Duration::days(1))
    }

    /// The calendar date
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// First second of the day
    pub fn start_timestamp(&self) -> String {
        format!("{}T00:00:00Z", self.date.format(ISO_DATE))
    }

    /// Last second of the day
    pub fn end_timestamp(&self) -> String {
        format!("{}T23:59:59Z", self.date.format(ISO_DATE))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(ISO_DATE))
    }
}

impl FromStr for DateWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateWindow {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DateWindow> for String {
    fn from(window: DateWindow) -> Self {
        window.to_string()
    }
}
