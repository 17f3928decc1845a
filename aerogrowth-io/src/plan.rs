//! Render plan: what a plotting front-end should draw.
//!
//! Pixel rendering is out of scope. The plot toggles instead produce a
//! [`RenderPlan`], a plain data description of the figure with every time
//! already converted to a date string.

use aerogrowth_core::time::JSON_TIME_FORMAT;
use aerogrowth_core::{Epoch, GrowthLine, IncompleteMarker, Method, Point};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// Text shown when the selected event set is empty.
pub const NO_EVENTS_TEXT: &str = "No events found!";

/// Trace colour per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineColor {
    /// Mode fitting.
    Black,
    /// Maximum concentration.
    White,
    /// Appearance time.
    Green,
}

impl LineColor {
    /// Colour used for `method`.
    #[must_use]
    pub fn for_method(method: Method) -> Self {
        match method {
            Method::ModeFitting => Self::Black,
            Method::MaxConcentration => Self::White,
            Method::AppearanceTime => Self::Green,
        }
    }
}

/// Trace style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Complete line.
    Solid,
    /// Line touching the padded-window edge.
    Dashed,
}

/// Which lines the plan draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every line of every method, without events.
    AllLines,
    /// Lines of all events.
    AllEvents,
    /// Lines of final events.
    FinalEvents,
    /// No lines.
    Nothing,
}

/// Text anchored at a (time, diameter) position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Text to draw.
    pub text: String,
    /// Anchor time.
    pub time: String,
    /// Anchor diameter (nm).
    pub diameter: f64,
}

impl Annotation {
    pub(crate) fn at(text: impl Into<String>, point: Point, epoch: &Epoch) -> Self {
        Self {
            text: text.into(),
            time: epoch.format(point.time, JSON_TIME_FORMAT),
            diameter: point.diameter,
        }
    }
}

/// One fitted growth line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    /// Line identifier.
    pub id: String,
    /// Producing method.
    pub method: Method,
    /// Trace colour.
    pub color: LineColor,
    /// Trace style.
    pub style: LineStyle,
    /// Fitted points as (time, diameter).
    pub fitted_points: Vec<(String, f64)>,
    /// Growth rate label at the middle fitted point.
    pub rate_label: Annotation,
}

impl LineTrace {
    /// Builds the trace for `line`.
    #[must_use]
    pub fn new(line: &GrowthLine, incomplete: bool, epoch: &Epoch) -> Self {
        let middle = line.fitted_points[line.fitted_points.len() / 2];
        Self {
            id: line.id.clone(),
            method: line.method,
            color: LineColor::for_method(line.method),
            style: if incomplete {
                LineStyle::Dashed
            } else {
                LineStyle::Solid
            },
            fitted_points: line
                .fitted_points
                .iter()
                .map(|p| (epoch.format(p.time, JSON_TIME_FORMAT), p.diameter))
                .collect(),
            rate_label: Annotation::at(format!("{:.2}", line.growth_rate), middle, epoch),
        }
    }
}

/// Raw detections of one method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    /// Producing method.
    pub method: Method,
    /// Marker colour.
    pub color: LineColor,
    /// Points as (time, diameter).
    pub points: Vec<(String, f64)>,
}

/// Everything a plotting front-end needs to draw the result figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    /// Which lines are drawn.
    pub selection: Selection,
    /// Line traces.
    pub lines: Vec<LineTrace>,
    /// Growth-rate range boxes at event mid locations.
    pub event_info: Vec<Annotation>,
    /// Raw detections per method.
    pub points: Vec<PointSeries>,
    /// Midnights within the display window.
    pub day_boundaries: Vec<String>,
    /// Marker for an empty event selection.
    pub no_events: Option<Annotation>,
}

/// Raw-point membership sets collected from rendered lines.
///
/// Mode-fitting peaks are matched on diameter, maximum-concentration and
/// appearance-time peaks on timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPointSets {
    mf_diameters: BTreeSet<u64>,
    mc_times: BTreeSet<NaiveDateTime>,
    at_times: BTreeSet<NaiveDateTime>,
}

impl RenderedPointSets {
    /// Folds the raw points of `lines` into membership sets.
    #[must_use]
    pub fn collect<'a, I>(lines: I, epoch: &Epoch) -> Self
    where
        I: IntoIterator<Item = &'a GrowthLine>,
    {
        lines.into_iter().fold(Self::default(), |mut sets, line| {
            let times = line.points.iter().map(|p| epoch.to_datetime(p.time));
            match line.method {
                Method::ModeFitting => sets
                    .mf_diameters
                    .extend(line.points.iter().map(|p| p.diameter.to_bits())),
                Method::MaxConcentration => sets.mc_times.extend(times),
                Method::AppearanceTime => sets.at_times.extend(times),
            }
            sets
        })
    }

    /// Returns true if a raw `point` of `method` belongs to a rendered line.
    #[must_use]
    pub fn admits(&self, method: Method, point: Point, epoch: &Epoch) -> bool {
        match method {
            Method::ModeFitting => self.mf_diameters.contains(&point.diameter.to_bits()),
            Method::MaxConcentration => self.mc_times.contains(&epoch.to_datetime(point.time)),
            Method::AppearanceTime => self.at_times.contains(&epoch.to_datetime(point.time)),
        }
    }
}

/// Returns true if `line` may be cut off by the padded-window edge.
///
/// A line is incomplete when one of its fitted times, converted to a whole
/// second, equals a marker time. Mode-fitting lines are never incomplete.
#[must_use]
pub fn is_incomplete(line: &GrowthLine, markers: &[IncompleteMarker], epoch: &Epoch) -> bool {
    if line.method == Method::ModeFitting || markers.is_empty() {
        return false;
    }
    let marked: BTreeSet<NaiveDateTime> = markers.iter().map(|m| m.time).collect();
    line.fitted_points
        .iter()
        .any(|p| marked.contains(&epoch.to_datetime(p.time)))
}
