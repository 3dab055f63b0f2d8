//! Acquisition date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A half-open acquisition window `[start, end)`.
///
/// Scenes are matched on their acquisition start time, so a range ending
/// on `2018-12-31` excludes scenes acquired on that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = InvalidDateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a date range.
    ///
    /// # Errors
    ///
    /// Returns an error unless `start` is strictly before `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRangeError> {
        if start >= end {
            return Err(InvalidDateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive start date.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end date.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start as milliseconds since the Unix epoch (UTC midnight).
    #[must_use]
    pub fn start_millis(&self) -> i64 {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
    }

    /// End as milliseconds since the Unix epoch (UTC midnight).
    #[must_use]
    pub fn end_millis(&self) -> i64 {
        self.end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Error returned when a date range is empty or inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDateRangeError {
    /// Requested start.
    pub start: NaiveDate,
    /// Requested end.
    pub end: NaiveDate,
}

impl std::fmt::Display for InvalidDateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date range {}..{}: start must be before end",
            self.start, self.end
        )
    }
}

impl std::error::Error for InvalidDateRangeError {}
