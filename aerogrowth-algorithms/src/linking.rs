//! Pairwise linking rules deciding which growth lines describe the same event.

use aerogrowth_core::{EventConfig, GrowthLine};

const HOURS_PER_DAY: f64 = 24.0;

/// Decides whether two lines belong to the same event.
///
/// The synthesizer joins linked lines transitively, so a policy only has to
/// judge pairs.
pub trait LinkPolicy {
    /// Returns true if `a` and `b` trace the same growth feature.
    fn links(&self, a: &GrowthLine, b: &GrowthLine, config: &EventConfig) -> bool;

    /// Returns the name of the policy.
    fn name(&self) -> &'static str;
}

/// Links lines that run alongside each other or continue one another.
///
/// - Overlapping in time: linked if at some shared time the fitted diameters
///   are within `diameter_tolerance` of each other.
/// - Disjoint in time: linked if the gap is at most `time_gap_hours` and the
///   end of the earlier line is within `diameter_tolerance` of the start of
///   the later one.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapLinking;

impl OverlapLinking {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LinkPolicy for OverlapLinking {
    fn links(&self, a: &GrowthLine, b: &GrowthLine, config: &EventConfig) -> bool {
        let lo = a.start().time.max(b.start().time);
        let hi = a.end().time.min(b.end().time);

        if lo <= hi {
            return shared_times(a, b, lo, hi).any(|time| {
                match (a.diameter_at(time), b.diameter_at(time)) {
                    (Some(da), Some(db)) => {
                        relative_difference(da, db) <= config.diameter_tolerance
                    }
                    _ => false,
                }
            });
        }

        let (first, second) = if a.end().time < b.start().time {
            (a, b)
        } else {
            (b, a)
        };
        let gap_hours = (second.start().time - first.end().time) * HOURS_PER_DAY;
        gap_hours <= config.time_gap_hours
            && relative_difference(first.end().diameter, second.start().diameter)
                <= config.diameter_tolerance
    }

    fn name(&self) -> &'static str {
        "Overlap"
    }
}

/// Overlap bounds plus every fitted time of either line inside them.
fn shared_times<'a>(
    a: &'a GrowthLine,
    b: &'a GrowthLine,
    lo: f64,
    hi: f64,
) -> impl Iterator<Item = f64> + 'a {
    [lo, hi].into_iter().chain(
        a.fitted_points
            .iter()
            .chain(&b.fitted_points)
            .map(|p| p.time)
            .filter(move |&t| t >= lo && t <= hi),
    )
}

/// `|a - b|` relative to the smaller magnitude.
pub(crate) fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().min(b.abs());
    if scale == 0.0 {
        return if a == b { 0.0 } else { f64::INFINITY };
    }
    (a - b).abs() / scale
}
