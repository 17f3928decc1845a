//! Per-timestamp breakdown of events.
#![allow(clippy::cast_possible_truncation)]

use aerogrowth_core::{Event, EventTimestamps, GrowthLine, RateSummary, TimestampRecord};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Breaks every event down by the timestamps its member lines touch.
///
/// Raw and fitted times of all members are collected; times within the same
/// second are merged. At each timestamp the lines whose fitted span covers it
/// are listed together with their rate statistics, which stay `None` where no
/// line is active.
#[must_use]
pub fn timestamp_info(events: &[Event]) -> Vec<EventTimestamps<'_>> {
    events.iter().map(event_timestamps).collect()
}

fn event_timestamps(event: &Event) -> EventTimestamps<'_> {
    let mut times: BTreeMap<i64, f64> = BTreeMap::new();
    for point in event
        .lines
        .iter()
        .flat_map(|line| line.points.iter().chain(&line.fitted_points))
    {
        let second = (point.time * SECONDS_PER_DAY).round() as i64;
        times.entry(second).or_insert(point.time);
    }

    let records = times
        .into_values()
        .map(|time| {
            let lines: Vec<&GrowthLine> = event
                .lines
                .iter()
                .filter(|line| line.is_active_at(time))
                .collect();
            let rates = RateSummary::from_rates(lines.iter().map(|line| line.growth_rate));
            TimestampRecord { time, lines, rates }
        })
        .collect();

    EventTimestamps {
        label: &event.label,
        records,
    }
}
