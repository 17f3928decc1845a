//! aerogrowth-io: Loaders and result output for aerogrowth.
//!
//! This crate reads size-distribution records into concentration surfaces,
//! replays recorded detections, and reports synthesized events as text,
//! JSON artifacts and render plans.
//!

#[cfg(feature = "hdf5")]
pub mod columnar;
pub mod delimited;
mod detections;
mod error;
pub mod grid;
mod loader;
pub mod plan;
mod report;
mod writer;

#[cfg(feature = "hdf5")]
pub use columnar::ColumnarLoader;
pub use delimited::DelimitedLoader;
pub use detections::RecordedDetections;
pub use error::{Error, Result};
pub use grid::RawGrid;
pub use loader::{is_columnar, open_loader, SurfaceLoader};
pub use plan::RenderPlan;
pub use report::{format_rate_range, ReportStatus, Reporter};
pub use writer::{output_prefix, ResultWriter};
