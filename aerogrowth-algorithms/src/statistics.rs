//! Growth-rate statistics of events.
#![allow(clippy::cast_precision_loss)]

use aerogrowth_core::{Afe, Event, GrowthLine, Point, RateSummary};
use log::warn;
use std::collections::BTreeSet;

/// Mean absolute fractional error of `rates` around their mean.
///
/// `mean(|r - avg|) / |avg|`. Undefined (`None`) for an empty slice or a
/// zero average.
#[must_use]
pub fn mean_absolute_fractional_error(rates: &[f64]) -> Option<f64> {
    let summary = RateSummary::from_rates(rates.iter().copied())?;
    if summary.avg == 0.0 {
        return None;
    }
    let mean_abs = rates.iter().map(|r| (r - summary.avg).abs()).sum::<f64>() / rates.len() as f64;
    Some(mean_abs / summary.avg.abs())
}

/// Per-line absolute fractional errors against `avg`.
#[must_use]
pub fn absolute_fractional_errors(lines: &[GrowthLine], avg: f64) -> Vec<Afe> {
    if avg == 0.0 {
        return Vec::new();
    }
    lines
        .iter()
        .map(|line| Afe {
            line_id: line.id.clone(),
            value: (line.growth_rate - avg).abs() / avg.abs(),
        })
        .collect()
}

/// Centroid of the union of all fitted points.
///
/// Points shared by several lines count once. `None` if there are no points.
#[must_use]
pub fn mid_location(lines: &[GrowthLine]) -> Option<Point> {
    let unique: BTreeSet<(u64, u64)> = lines
        .iter()
        .flat_map(|line| &line.fitted_points)
        .map(|p| (p.time.to_bits(), p.diameter.to_bits()))
        .collect();
    if unique.is_empty() {
        return None;
    }
    let n = unique.len() as f64;
    let (sum_t, sum_d) = unique.iter().fold((0.0, 0.0), |(t, d), &(tb, db)| {
        (t + f64::from_bits(tb), d + f64::from_bits(db))
    });
    Some(Point::new(sum_t / n, sum_d / n))
}

/// Builds an event with statistics from its member lines.
///
/// Lines are ordered by fitted start time, then id. MAFE is reported for two
/// or more lines whose rates differ, and AFEs additionally need more than two
/// lines. Returns `None` for an empty member list.
#[must_use]
pub fn build_event(label: String, mut lines: Vec<GrowthLine>) -> Option<Event> {
    lines.sort_by(|a, b| {
        a.start()
            .time
            .total_cmp(&b.start().time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let rate_values: Vec<f64> = lines.iter().map(|line| line.growth_rate).collect();
    let rates = RateSummary::from_rates(rate_values.iter().copied())?;
    let mid_location = mid_location(&lines)?;

    let spread = !rates.is_single_rate();
    let mafe = if spread {
        let mafe = mean_absolute_fractional_error(&rate_values);
        if mafe.is_none() {
            warn!("{label}: average growth rate is zero, MAFE undefined");
        }
        mafe
    } else {
        None
    };

    let afes = if spread && lines.len() > 2 {
        absolute_fractional_errors(&lines, rates.avg)
    } else {
        Vec::new()
    };

    Some(Event {
        label,
        lines,
        rates,
        mafe,
        afes,
        mid_location,
    })
}
