//! Growth events and their per-timestamp breakdown.

use crate::line::{GrowthLine, Method, Point};
use std::collections::BTreeSet;

/// Average, minimum and maximum of a set of growth rates (nm/h).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSummary {
    /// Arithmetic mean.
    pub avg: f64,
    /// Smallest rate.
    pub min: f64,
    /// Largest rate.
    pub max: f64,
}

impl RateSummary {
    /// Summarizes `rates`; `None` if empty.
    #[must_use]
    pub fn from_rates<I: IntoIterator<Item = f64>>(rates: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for rate in rates {
            count += 1;
            sum += rate;
            min = min.min(rate);
            max = max.max(rate);
        }
        if count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = sum / count as f64;
        Some(Self { avg, min, max })
    }

    /// Returns true if every rate was the same.
    #[must_use]
    pub fn is_single_rate(&self) -> bool {
        self.min.to_bits() == self.max.to_bits()
    }
}

/// Absolute fractional error of one member line against the event average.
#[derive(Debug, Clone, PartialEq)]
pub struct Afe {
    /// Member line identifier.
    pub line_id: String,
    /// `|rate - avg| / |avg|`.
    pub value: f64,
}

/// A cluster of growth lines describing one growth episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// `event1`, `event2`, ... in order of start time.
    pub label: String,
    /// Member lines, ordered by fitted start time.
    pub lines: Vec<GrowthLine>,
    /// Rate statistics over members.
    pub rates: RateSummary,
    /// Mean absolute fractional error; `None` for single-line events.
    pub mafe: Option<f64>,
    /// Per-line errors, only populated for events with more than two lines.
    pub afes: Vec<Afe>,
    /// Centroid of all fitted points, used to place labels.
    pub mid_location: Point,
}

impl Event {
    /// Number of member lines.
    #[must_use]
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Distinct methods contributing lines.
    #[must_use]
    pub fn methods(&self) -> BTreeSet<Method> {
        self.lines.iter().map(|line| line.method).collect()
    }

    /// Earliest fitted time among members.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.start().time)
            .fold(f64::INFINITY, f64::min)
    }

    /// Latest fitted time among members.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.end().time)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Lines active at one timestamp of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampRecord<'a> {
    /// Days since the epoch.
    pub time: f64,
    /// Member lines whose fitted span covers `time`.
    pub lines: Vec<&'a GrowthLine>,
    /// Rate statistics over `lines`; `None` when no line is active.
    pub rates: Option<RateSummary>,
}

/// Per-timestamp breakdown of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimestamps<'a> {
    /// Label of the event.
    pub label: &'a str,
    /// Records in increasing time order.
    pub records: Vec<TimestampRecord<'a>>,
}
