//! Run configuration.
//!
//! One immutable [`AnalysisConfig`] is built per run and passed by reference
//! through every stage.
#![allow(clippy::struct_excessive_bools)]

use crate::detection::DetectionThresholds;
use crate::time::RequestedWindow;
use crate::{Error, Result};
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResultConfig {
    /// Show raw peaks even when no line absorbed them.
    pub plot_all_points: bool,
    /// Show every line from every method instead of events.
    pub plot_all_lines: bool,
    /// Show all detected events.
    pub plot_all_events: bool,
    /// Show final events.
    pub plot_final_events: bool,
    /// Print final events.
    pub print_final_event_info: bool,
    /// Save final events as JSON.
    pub save_final_event_info: bool,
    /// Print the per-timestamp breakdown.
    pub print_ts_info: bool,
    /// Save the per-timestamp breakdown as JSON.
    pub save_ts_info: bool,
    /// Annotate each event with its growth-rate range.
    pub plot_event_info: bool,
    /// Show disappearance times.
    pub plot_disappearance_times: bool,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            plot_all_points: false,
            plot_all_lines: false,
            plot_all_events: false,
            plot_final_events: true,
            print_final_event_info: false,
            save_final_event_info: false,
            print_ts_info: false,
            save_ts_info: false,
            plot_event_info: false,
            plot_disappearance_times: false,
        }
    }
}

impl ResultConfig {
    /// Returns true if an event set is selected for rendering.
    #[must_use]
    pub fn renders_events(&self) -> bool {
        self.plot_all_events || self.plot_final_events
    }

    /// Returns true if any rendering toggle is set.
    #[must_use]
    pub fn renders_anything(&self) -> bool {
        self.plot_all_points
            || self.plot_all_lines
            || self.renders_events()
            || self.plot_disappearance_times
    }

    /// Rejects toggle combinations that cannot be honored.
    ///
    /// # Errors
    /// Returns [`Error::ConfigurationConflict`] if event annotations are
    /// requested without an event set to annotate.
    pub fn validate(&self) -> Result<()> {
        if self.plot_event_info && !self.renders_events() {
            return Err(Error::ConfigurationConflict(
                "cannot plot event information as no events are plotted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the line-linking policy used to form events.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventConfig {
    /// Maximum relative diameter difference for two lines to be linked.
    pub diameter_tolerance: f64,
    /// Maximum gap (hours) between one line's end and another's start.
    pub time_gap_hours: f64,
    /// Distinct methods required for a final event without peak-area support.
    pub min_methods: usize,
    /// Relative diameter tolerance when matching a line start to a peak area.
    pub area_channel_tolerance: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            diameter_tolerance: 0.25,
            time_gap_hours: 1.5,
            min_methods: 2,
            area_channel_tolerance: 0.1,
        }
    }
}

impl EventConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the diameter tolerance.
    #[must_use]
    pub fn with_diameter_tolerance(mut self, tolerance: f64) -> Self {
        self.diameter_tolerance = tolerance;
        self
    }

    /// Sets the allowed time gap.
    #[must_use]
    pub fn with_time_gap_hours(mut self, hours: f64) -> Self {
        self.time_gap_hours = hours;
        self
    }

    /// Sets the method-diversity requirement.
    #[must_use]
    pub fn with_min_methods(mut self, methods: usize) -> Self {
        self.min_methods = methods;
        self
    }

    /// Sets the peak-area channel tolerance.
    #[must_use]
    pub fn with_area_channel_tolerance(mut self, tolerance: f64) -> Self {
        self.area_channel_tolerance = tolerance;
        self
    }
}

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Input record (columnar dataset or delimited file).
    pub input: PathBuf,
    /// `YYYY-MM-DD[ HH:MM:SS]`.
    pub start_date: String,
    /// `YYYY-MM-DD[ HH:MM:SS]`; date-only means end of day.
    pub end_date: String,
    /// Refit multimodal distributions.
    pub fit_multimodes: bool,
    /// Mode-fitting MAPE threshold constant.
    pub mape_threshold_factor: f64,
    /// Mode-fitting growth-rate change limit (%).
    pub gr_error_threshold_mf: f64,
    /// MC/AT MAE threshold constant.
    pub mae_threshold_factor: f64,
    /// MC/AT growth-rate change limit (%).
    pub gr_error_threshold_mcat: f64,
    /// Highest diameter channel (nm) lines are extended into.
    pub maximum_diameter_channel: f64,
    /// Highest diameter channel (nm) lines may start from.
    pub maximum_growth_start_channel: f64,
    /// Maximum time between two peaks (hours).
    pub maximum_peak_difference_hours: f64,
    /// Peak-area start derivative (cm⁻³/h).
    pub derivative_threshold: f64,
    /// Event linking policy.
    pub events: EventConfig,
    /// Output toggles.
    pub results: ResultConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            start_date: String::new(),
            end_date: String::new(),
            fit_multimodes: false,
            mape_threshold_factor: 15.0,
            gr_error_threshold_mf: 60.0,
            mae_threshold_factor: 1.0,
            gr_error_threshold_mcat: 60.0,
            maximum_diameter_channel: 60.0,
            maximum_growth_start_channel: 40.0,
            maximum_peak_difference_hours: 2.0,
            derivative_threshold: 200.0,
            events: EventConfig::default(),
            results: ResultConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration for `input` over `[start_date, end_date]`.
    #[must_use]
    pub fn new(
        input: impl Into<PathBuf>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            ..Self::default()
        }
    }

    /// Sets the output toggles.
    #[must_use]
    pub fn with_results(mut self, results: ResultConfig) -> Self {
        self.results = results;
        self
    }

    /// Sets the event linking policy.
    #[must_use]
    pub fn with_events(mut self, events: EventConfig) -> Self {
        self.events = events;
        self
    }

    /// Sets the highest start channel (nm).
    #[must_use]
    pub fn with_maximum_growth_start_channel(mut self, nm: f64) -> Self {
        self.maximum_growth_start_channel = nm;
        self
    }

    /// Resolves the requested window.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWindow`] if the dates cannot be parsed.
    pub fn window(&self) -> Result<RequestedWindow> {
        RequestedWindow::parse(&self.start_date, &self.end_date)
    }

    /// Detection parameters for the external fitters.
    #[must_use]
    pub fn thresholds(&self) -> DetectionThresholds {
        DetectionThresholds {
            fit_multimodes: self.fit_multimodes,
            mape_threshold_factor: self.mape_threshold_factor,
            gr_error_threshold_mf: self.gr_error_threshold_mf,
            mae_threshold_factor: self.mae_threshold_factor,
            gr_error_threshold_mcat: self.gr_error_threshold_mcat,
            maximum_diameter_channel: self.maximum_diameter_channel,
            maximum_growth_start_channel: self.maximum_growth_start_channel,
            maximum_peak_difference_hours: self.maximum_peak_difference_hours,
            derivative_threshold: self.derivative_threshold,
        }
    }

    /// Checks the configuration before any work is done.
    ///
    /// # Errors
    /// Returns [`Error::ConfigurationConflict`] for incompatible toggles and
    /// [`Error::InvalidWindow`] for unparsable dates.
    pub fn validate(&self) -> Result<()> {
        self.results.validate()?;
        self.window()?;
        Ok(())
    }
}
