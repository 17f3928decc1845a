//! Error types for aerogrowth-core.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias for aerogrowth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for aerogrowth operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Two or more rows collapsed onto the same timestamp after alignment.
    ///
    /// `original` lists every pre-alignment timestamp of the affected window so
    /// the uneven sampling can be located in the raw record.
    #[error(
        "multiple identical timestamps detected ({} colliding); make sure the data has been sampled evenly",
        duplicates.len()
    )]
    DuplicateTimestamp {
        original: Vec<NaiveDateTime>,
        duplicates: Vec<NaiveDateTime>,
    },

    /// Malformed raw input (bin labels, time columns, dataset layout).
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Mutually incompatible output options.
    #[error("configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// Requested analysis window could not be resolved.
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// External detection stage failed.
    #[error("detection error: {0}")]
    Detection(String),
}
