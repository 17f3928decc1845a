//! aerogrowth-core: Core types for aerosol particle growth analysis.
//!
//! This crate provides the concentration surface, the time axis, growth
//! lines with their detection contract, events, and run configuration.
//!

pub mod config;
pub mod detection;
pub mod error;
pub mod event;
pub mod line;
pub mod surface;
pub mod time;

pub use config::{AnalysisConfig, EventConfig, ResultConfig};
pub use detection::{Detections, DetectionThresholds, GrowthDetector, MethodDetections};
pub use error::{Error, Result};
pub use event::{Afe, Event, EventTimestamps, RateSummary, TimestampRecord};
pub use line::{GrowthLine, IncompleteMarker, Method, PeakAreaEdge, Point};
pub use surface::{ConcentrationSurface, LoadedSurfaces};
pub use time::{Epoch, RequestedWindow};
