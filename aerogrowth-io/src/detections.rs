//! Detections recorded by the external peak detectors and line fitters.

use crate::Result;
use aerogrowth_core::{
    ConcentrationSurface, DetectionThresholds, Detections, GrowthDetector, Method,
};
use log::{debug, info};
use std::io::Read;
use std::path::Path;

/// A [`GrowthDetector`] replaying detections from a JSON document.
///
/// Point times in the document are day offsets from the requested start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedDetections {
    detections: Detections,
}

impl RecordedDetections {
    /// Wraps already decoded detections.
    #[must_use]
    pub fn new(detections: Detections) -> Self {
        Self { detections }
    }

    /// Reads detections from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid
    /// detections document.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let recorded = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            "read {} recorded growth lines from {}",
            recorded.detections.line_count(),
            path.display()
        );
        Ok(recorded)
    }

    /// Reads detections from JSON.
    ///
    /// # Errors
    /// Returns an error if the input is not a valid detections document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let detections: Detections = serde_json::from_reader(reader)?;
        Ok(Self { detections })
    }

    /// Returns the recorded detections.
    #[must_use]
    pub fn detections(&self) -> &Detections {
        &self.detections
    }
}

impl GrowthDetector for RecordedDetections {
    fn detect(
        &self,
        surface: &ConcentrationSurface,
        thresholds: &DetectionThresholds,
    ) -> aerogrowth_core::Result<Detections> {
        debug!(
            "replaying detections for a {}x{} surface (start channel limit {} nm)",
            surface.n_times(),
            surface.n_diameters(),
            thresholds.maximum_growth_start_channel
        );
        for method in Method::ALL {
            let output = self.detections.method(method);
            debug!(
                "{method}: {} peaks, {} lines, {} incomplete",
                output.peaks.len(),
                output.lines.len(),
                output.incomplete.len()
            );
        }
        Ok(self.detections.clone())
    }

    fn name(&self) -> &'static str {
        "recorded"
    }
}
