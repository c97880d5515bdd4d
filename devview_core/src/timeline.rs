//! The "TIME" axis - second-resolution timestamps.
//!
//! Samples are keyed by a calendar timestamp stored as fixed-width text
//! (`YYYY-MM-DD HH:MM:SS`). The text form is canonical: it is what the store
//! compares against, so parsing only accepts input that re-encodes to exactly
//! the same string.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// `chrono` format of the canonical timestamp text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: u32 = 86_400;

/// Timestamp text that is not in canonical `YYYY-MM-DD HH:MM:SS` form.
///
/// This includes text of the right shape that names a calendar instant that
/// does not exist, such as `2024-02-30 00:00:00` or `2024-01-01 24:00:00`.
/// Those are rejected rather than stepped digit by digit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("malformed timestamp {0:?} (expected YYYY-MM-DD HH:MM:SS)")]
    Malformed(String),
}

/// What happens to the date when the clock passes `23:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayRollover {
    /// Clock resets to `00:00:00` on the same date.
    ///
    /// This is the recorded behavior of the playback loop. Timelines that
    /// cross midnight will jump back to the start of the first day.
    #[default]
    WrapWithinDay,
    /// Clock resets to `00:00:00` on the following date.
    AdvanceDate,
}

/// A second-resolution point on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Builds a timestamp, dropping any sub-second part.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Returns the timestamp one second later.
    ///
    /// Seconds carry into minutes and minutes into hours. Past `23:59:59`
    /// the clock resets to midnight and `rollover` decides the date.
    pub fn next_second(&self, rollover: DayRollover) -> Self {
        let seconds = self.0.time().num_seconds_from_midnight() + 1;
        if seconds < SECONDS_PER_DAY {
            let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
                .unwrap_or_default();
            return Self(self.0.date().and_time(time));
        }

        let date = match rollover {
            DayRollover::WrapWithinDay => self.0.date(),
            DayRollover::AdvanceDate => self.0.date().succ_opt().unwrap_or(self.0.date()),
        };
        Self(date.and_time(NaiveTime::default()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TimestampError::Malformed(s.to_string());

        let datetime =
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|_| malformed())?;
        // Leap seconds parse as nanosecond overflow
        if datetime.nanosecond() != 0 {
            return Err(malformed());
        }

        let timestamp = Self(datetime);
        if timestamp.to_string() != s {
            return Err(malformed());
        }
        Ok(timestamp)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
