//! Growth lines and the raw detections they are fitted from.

use chrono::NaiveDateTime;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Detection method that produced a line or peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Method {
    /// Multimodal distribution fits per timestamp.
    #[cfg_attr(feature = "serde", serde(rename = "MF"))]
    ModeFitting,
    /// Diameter of maximum concentration within peak areas.
    #[cfg_attr(feature = "serde", serde(rename = "MC"))]
    MaxConcentration,
    /// First time a channel's concentration derivative crosses the threshold.
    #[cfg_attr(feature = "serde", serde(rename = "AT"))]
    AppearanceTime,
}

impl Method {
    /// All methods in reporting order.
    pub const ALL: [Method; 3] = [
        Method::ModeFitting,
        Method::MaxConcentration,
        Method::AppearanceTime,
    ];

    /// Short tag used in labels and serialized output.
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Method::ModeFitting => "MF",
            Method::MaxConcentration => "MC",
            Method::AppearanceTime => "AT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A (time, diameter) sample. Time is in days since the run epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(f64, f64)", into = "(f64, f64)"))]
pub struct Point {
    /// Days since the epoch.
    pub time: f64,
    /// Diameter in nanometers.
    pub diameter: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub fn new(time: f64, diameter: f64) -> Self {
        Self { time, diameter }
    }
}

impl From<(f64, f64)> for Point {
    fn from((time, diameter): (f64, f64)) -> Self {
        Self { time, diameter }
    }
}

impl From<Point> for (f64, f64) {
    fn from(point: Point) -> Self {
        (point.time, point.diameter)
    }
}

/// A regression-fitted growth trajectory from one detection method.
///
/// Contract (enforced by [`GrowthLine::assert_contract`]): at least two raw
/// and two fitted points, all values finite, fitted times strictly increasing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrowthLine {
    /// Stable identifier, e.g. `MC3`.
    pub id: String,
    /// Producing method.
    pub method: Method,
    /// Raw detections absorbed into the line.
    pub points: Vec<Point>,
    /// Regression points.
    pub fitted_points: Vec<Point>,
    /// Growth rate in nm/h.
    pub growth_rate: f64,
}

impl GrowthLine {
    /// Creates a line, panicking if it violates the line contract.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        method: Method,
        points: Vec<Point>,
        fitted_points: Vec<Point>,
        growth_rate: f64,
    ) -> Self {
        let line = Self {
            id: id.into(),
            method,
            points,
            fitted_points,
            growth_rate,
        };
        line.assert_contract();
        line
    }

    /// Panics if the line breaks the contract promised by the fitters.
    ///
    /// A broken line means the upstream detector is faulty; there is no
    /// sensible way to repair it here.
    pub fn assert_contract(&self) {
        assert!(
            self.points.len() >= 2,
            "growth line {} has {} raw points, expected at least 2",
            self.id,
            self.points.len()
        );
        assert!(
            self.fitted_points.len() >= 2,
            "growth line {} has {} fitted points, expected at least 2",
            self.id,
            self.fitted_points.len()
        );
        assert!(
            self.fitted_points.len() <= self.points.len(),
            "growth line {} has more fitted points than raw points",
            self.id
        );
        assert!(
            self.growth_rate.is_finite(),
            "growth line {} has non-finite growth rate",
            self.id
        );
        assert!(
            self.points
                .iter()
                .chain(&self.fitted_points)
                .all(|p| p.time.is_finite() && p.diameter.is_finite()),
            "growth line {} has non-finite points",
            self.id
        );
        assert!(
            self.fitted_points
                .windows(2)
                .all(|pair| pair[0].time < pair[1].time),
            "growth line {} has fitted times that are not strictly increasing",
            self.id
        );
    }

    /// First fitted point.
    #[must_use]
    pub fn start(&self) -> Point {
        self.fitted_points[0]
    }

    /// Last fitted point.
    #[must_use]
    pub fn end(&self) -> Point {
        self.fitted_points[self.fitted_points.len() - 1]
    }

    /// Returns true if `time` falls within the fitted time span.
    #[must_use]
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start().time && time <= self.end().time
    }

    /// Fitted diameter at `time`, linearly interpolated between fitted points.
    #[must_use]
    pub fn diameter_at(&self, time: f64) -> Option<f64> {
        if !self.is_active_at(time) {
            return None;
        }
        let upper = self
            .fitted_points
            .iter()
            .position(|p| p.time >= time)
            .unwrap_or(self.fitted_points.len() - 1);
        if upper == 0 {
            return Some(self.fitted_points[0].diameter);
        }
        let (a, b) = (self.fitted_points[upper - 1], self.fitted_points[upper]);
        let frac = (time - a.time) / (b.time - a.time);
        Some(a.diameter + frac * (b.diameter - a.diameter))
    }
}

/// A raw detection touching the padded-window edge.
///
/// Lines sharing a timestamp with one of these may be truncated by the
/// observation boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "IncompleteMarkerRepr", into = "IncompleteMarkerRepr")
)]
pub struct IncompleteMarker {
    /// Calendar time of the edge detection.
    pub time: NaiveDateTime,
    /// Diameter in nanometers.
    pub diameter: f64,
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct IncompleteMarkerRepr(
    #[serde(with = "crate::time::serde_datetime")] NaiveDateTime,
    f64,
);

#[cfg(feature = "serde")]
impl From<IncompleteMarkerRepr> for IncompleteMarker {
    fn from(IncompleteMarkerRepr(time, diameter): IncompleteMarkerRepr) -> Self {
        Self { time, diameter }
    }
}

#[cfg(feature = "serde")]
impl From<IncompleteMarker> for IncompleteMarkerRepr {
    fn from(marker: IncompleteMarker) -> Self {
        Self(marker.time, marker.diameter)
    }
}

/// Bounds of one maximum-concentration peak area.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakAreaEdge {
    /// Diameter channel in nanometers.
    pub diameter: f64,
    /// Area start in days since the epoch.
    pub start: f64,
    /// Area end in days since the epoch.
    pub end: f64,
}

impl PeakAreaEdge {
    /// Returns true if `point` lies inside the area on `channel_tolerance`
    /// relative diameter distance.
    #[must_use]
    pub fn contains(&self, point: Point, channel_tolerance: f64) -> bool {
        point.time >= self.start
            && point.time <= self.end
            && (point.diameter - self.diameter).abs() <= channel_tolerance * self.diameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line() -> GrowthLine {
        GrowthLine::new(
            "MC1",
            Method::MaxConcentration,
            vec![Point::new(0.0, 5.0), Point::new(0.5, 10.0), Point::new(1.0, 15.0)],
            vec![Point::new(0.0, 5.0), Point::new(0.5, 10.0), Point::new(1.0, 15.0)],
            0.42,
        )
    }

    #[test]
    fn test_interpolated_diameter() {
        let line = line();
        assert_relative_eq!(line.diameter_at(0.25).unwrap(), 7.5);
        assert_relative_eq!(line.diameter_at(1.0).unwrap(), 15.0);
        assert_relative_eq!(line.diameter_at(0.0).unwrap(), 5.0);
        assert!(line.diameter_at(1.01).is_none());
        assert!(line.is_active_at(0.5));
    }

    #[test]
    #[should_panic(expected = "expected at least 2")]
    fn test_single_point_line_panics() {
        let _ = GrowthLine::new(
            "AT1",
            Method::AppearanceTime,
            vec![Point::new(0.0, 5.0)],
            vec![Point::new(0.0, 5.0)],
            1.0,
        );
    }

    #[test]
    #[should_panic(expected = "not strictly increasing")]
    fn test_unordered_fit_panics() {
        let _ = GrowthLine::new(
            "MF1",
            Method::ModeFitting,
            vec![Point::new(0.0, 5.0), Point::new(0.1, 6.0)],
            vec![Point::new(0.1, 6.0), Point::new(0.1, 5.0)],
            1.0,
        );
    }

    #[test]
    fn test_peak_area_contains() {
        let area = PeakAreaEdge {
            diameter: 10.0,
            start: 0.2,
            end: 0.4,
        };
        assert!(area.contains(Point::new(0.3, 10.5), 0.1));
        assert!(!area.contains(Point::new(0.3, 12.0), 0.1));
        assert!(!area.contains(Point::new(0.5, 10.0), 0.1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_line_json_layout() {
        let json = serde_json::to_value(line()).unwrap();
        assert_eq!(json["method"], "MC");
        assert_eq!(json["fitted_points"][1][1], 10.0);

        let marker: IncompleteMarker =
            serde_json::from_str(r#"["2004-09-20 12:15:00", 7.5]"#).unwrap();
        assert_eq!(marker.time.to_string(), "2004-09-20 12:15:00");
    }
}
