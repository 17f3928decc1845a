//! Contract for the external peak detectors and growth-line fitters.
//!
//! The fitting algorithms themselves live outside this workspace. The core
//! only depends on what they hand back: fitted lines, the raw peaks, and
//! markers for detections cut off by the padded-window edge.

use crate::line::{GrowthLine, IncompleteMarker, Method, PeakAreaEdge, Point};
use crate::surface::ConcentrationSurface;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output of one detection method.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MethodDetections {
    /// Raw peaks, whether or not a line absorbed them.
    pub peaks: Vec<Point>,
    /// Fitted growth lines.
    pub lines: Vec<GrowthLine>,
    /// Detections touching the padded-window edge.
    pub incomplete: Vec<IncompleteMarker>,
}

/// Combined output of all three methods.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Detections {
    /// Mode fitting.
    pub mode_fitting: MethodDetections,
    /// Maximum concentration.
    pub max_concentration: MethodDetections,
    /// Appearance time.
    pub appearance_time: MethodDetections,
    /// Peak areas found by the maximum-concentration method.
    pub mc_area_edges: Vec<PeakAreaEdge>,
}

impl Detections {
    /// Returns the output of one method.
    #[must_use]
    pub fn method(&self, method: Method) -> &MethodDetections {
        match method {
            Method::ModeFitting => &self.mode_fitting,
            Method::MaxConcentration => &self.max_concentration,
            Method::AppearanceTime => &self.appearance_time,
        }
    }

    /// Total number of fitted lines across methods.
    #[must_use]
    pub fn line_count(&self) -> usize {
        Method::ALL
            .iter()
            .map(|&method| self.method(method).lines.len())
            .sum()
    }

    /// Panics if any line was filed under the wrong method or breaks the
    /// line contract.
    pub fn assert_contract(&self) {
        for method in Method::ALL {
            for line in &self.method(method).lines {
                assert_eq!(
                    line.method, method,
                    "growth line {} is tagged {} but was reported by {}",
                    line.id, line.method, method
                );
                line.assert_contract();
            }
        }
    }
}

/// Detection parameters handed through to the external fitters unchanged.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionThresholds {
    /// Refit multimodal distributions instead of reusing cached fits.
    pub fit_multimodes: bool,
    /// Constant `a` of the mode-fitting MAPE threshold `a / len`.
    pub mape_threshold_factor: f64,
    /// Maximum growth-rate change (%) when extending a mode-fitting line.
    pub gr_error_threshold_mf: f64,
    /// Constant `a` of the MC/AT MAE threshold `a / len`.
    pub mae_threshold_factor: f64,
    /// Maximum growth-rate change (%) when extending an MC/AT line.
    pub gr_error_threshold_mcat: f64,
    /// Highest diameter channel (nm) lines are extended into.
    pub maximum_diameter_channel: f64,
    /// Highest diameter channel (nm) lines may start from.
    pub maximum_growth_start_channel: f64,
    /// Maximum time between two peaks in smoothed data (hours).
    pub maximum_peak_difference_hours: f64,
    /// Concentration derivative marking the start of a peak area (cm⁻³/h).
    pub derivative_threshold: f64,
}

impl DetectionThresholds {
    /// Error threshold for a line of `len` points: `factor / len`.
    ///
    /// Longer lines get a tighter threshold.
    #[must_use]
    pub fn adaptive_error_threshold(factor: f64, len: usize) -> f64 {
        if len == 0 {
            return f64::INFINITY;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = len as f64;
        factor / len
    }

    /// Returns true if moving from `previous` to `candidate` nm/h stays within
    /// `max_change_pct` percent.
    #[must_use]
    pub fn rate_change_within(previous: f64, candidate: f64, max_change_pct: f64) -> bool {
        if previous == 0.0 {
            return candidate == 0.0;
        }
        ((candidate - previous) / previous).abs() * 100.0 <= max_change_pct
    }

    /// Mode-fitting error threshold for a line of `len` points.
    #[must_use]
    pub fn mode_fitting_threshold(&self, len: usize) -> f64 {
        Self::adaptive_error_threshold(self.mape_threshold_factor, len)
    }

    /// MC/AT error threshold for a line of `len` points.
    #[must_use]
    pub fn max_concentration_threshold(&self, len: usize) -> f64 {
        Self::adaptive_error_threshold(self.mae_threshold_factor, len)
    }

    /// Rate-change limit (%) applicable to `method`.
    #[must_use]
    pub fn rate_change_limit(&self, method: Method) -> f64 {
        match method {
            Method::ModeFitting => self.gr_error_threshold_mf,
            Method::MaxConcentration | Method::AppearanceTime => self.gr_error_threshold_mcat,
        }
    }
}

/// The external peak-detection and line-fitting stage.
///
/// Implementations must be pure: the same surface and thresholds give the
/// same detections.
pub trait GrowthDetector {
    /// Runs all three methods over the padded surface.
    ///
    /// # Errors
    /// Returns an error if detection cannot be performed.
    fn detect(
        &self,
        surface: &ConcentrationSurface,
        thresholds: &DetectionThresholds,
    ) -> Result<Detections>;

    /// Name of the detector.
    fn name(&self) -> &'static str;
}
