//! Time axis handling.
//!
//! Computation runs on numeric day offsets from an [`Epoch`] (the requested
//! start date). Calendar datetimes only appear at the ingestion and
//! serialization boundaries.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc
)]

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Context added on each side of the requested window for detection.
pub const PADDING_HOURS: i64 = 12;

/// Instrument cadence that delimited records are snapped to.
pub const ALIGNMENT_MINUTES: i64 = 30;

/// Forward shift applied after snapping so stamps sit mid-bucket.
pub const ALIGNMENT_SHIFT_MINUTES: i64 = 15;

/// Timestamp format of serialized artifacts.
pub const JSON_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format of printed reports.
pub const TEXT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const SECONDS_PER_DAY: f64 = 86_400.0;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Zero point of the numeric day-offset time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(NaiveDateTime);

impl Epoch {
    /// Creates an epoch at the given instant.
    #[must_use]
    pub fn new(origin: NaiveDateTime) -> Self {
        Self(origin)
    }

    /// Returns the epoch instant.
    #[must_use]
    pub fn origin(&self) -> NaiveDateTime {
        self.0
    }

    /// Converts a datetime to fractional days since the epoch.
    #[must_use]
    pub fn days_since(&self, time: NaiveDateTime) -> f64 {
        let delta = time - self.0;
        let seconds = delta.num_seconds() as f64;
        let subsec = f64::from(delta.subsec_nanos()) / NANOS_PER_SECOND as f64;
        (seconds + subsec) / SECONDS_PER_DAY
    }

    /// Converts a day offset back to a datetime, rounded to whole seconds.
    #[must_use]
    pub fn to_datetime(&self, days: f64) -> NaiveDateTime {
        let seconds = (days * SECONDS_PER_DAY).round() as i64;
        self.0 + Duration::seconds(seconds)
    }

    /// Formats a day offset with the given `strftime` pattern.
    #[must_use]
    pub fn format(&self, days: f64, pattern: &str) -> String {
        self.to_datetime(days).format(pattern).to_string()
    }
}

/// A resolved analysis period.
///
/// Both bounds are inclusive. A date-only end bound covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl RequestedWindow {
    /// Creates a window from explicit bounds.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD[ HH:MM[:SS]]` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_bound(start, NaiveTime::default())?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
        let end = parse_bound(end, end_of_day)?;
        Self::new(start, end)
    }

    /// Effective start of the display window.
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Effective end of the display window.
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Start of the padded window.
    #[must_use]
    pub fn padded_start(&self) -> NaiveDateTime {
        self.start - Duration::hours(PADDING_HOURS)
    }

    /// End of the padded window.
    #[must_use]
    pub fn padded_end(&self) -> NaiveDateTime {
        self.end + Duration::hours(PADDING_HOURS)
    }

    /// Returns true if `time` lies in the display window.
    #[must_use]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time <= self.end
    }

    /// Returns true if `time` lies in the padded window.
    #[must_use]
    pub fn padded_contains(&self, time: NaiveDateTime) -> bool {
        time >= self.padded_start() && time <= self.padded_end()
    }

    /// The run epoch: the effective start date.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        Epoch::new(self.start)
    }
}

fn parse_bound(value: &str, default_time: NaiveTime) -> Result<NaiveDateTime> {
    let value = value.trim();
    for pattern in [JSON_TIME_FORMAT, TEXT_TIME_FORMAT] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(default_time))
        .map_err(|e| Error::InvalidWindow(format!("cannot parse date '{value}': {e}")))
}

/// Snaps a raw instant to the nearest half-hour tick, then shifts it forward
/// by a quarter hour.
///
/// Exact midpoints round to the even tick.
#[must_use]
pub fn align_to_half_hour(time: NaiveDateTime) -> NaiveDateTime {
    let day_start = time.date().and_time(NaiveTime::default());
    let step = ALIGNMENT_MINUTES * 60 * NANOS_PER_SECOND;
    let offset = i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND
        + i64::from(time.nanosecond());

    let mut tick = offset / step;
    let remainder = offset % step;
    match (2 * remainder).cmp(&step) {
        std::cmp::Ordering::Greater => tick += 1,
        std::cmp::Ordering::Equal if tick % 2 == 1 => tick += 1,
        _ => {}
    }

    day_start
        + Duration::minutes(tick * ALIGNMENT_MINUTES)
        + Duration::minutes(ALIGNMENT_SHIFT_MINUTES)
}

/// Serde adapter for datetimes in [`JSON_TIME_FORMAT`].
#[cfg(feature = "serde")]
pub mod serde_datetime {
    use super::JSON_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a datetime as a fixed-format string.
    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(JSON_TIME_FORMAT))
    }

    /// Deserializes a fixed-format datetime string.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, JSON_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
